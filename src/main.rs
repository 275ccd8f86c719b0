//! rig CLI - typed environment configuration with remote sync.

use clap::Parser;
use rigging::audit;
use rigging::cli::{
    Cli, Commands, EnvCommands, ProjectCommands, RemoteCommands, SchemaCommands, SheetCommands,
    StoreCommands,
};
use rigging::commands::{self, NewSheet, Output};
use rigging::settings;
use std::path::Path;
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine home: --home flag > RIG_HOME env > ~/.rigging
    let home = match settings::resolve_home(cli.home) {
        Ok(home) => home,
        Err(e) => {
            if human {
                eprintln!("Error: {}", e);
            } else {
                eprintln!(r#"{{"error": "{}"}}"#, e);
            }
            process::exit(1);
        }
    };

    // Serialize command for logging
    let (cmd_name, args_json) = serialize_command(&cli.command);

    // Start timing
    let start = Instant::now();

    // Execute command
    let result = run_command(cli.command, &home, human);

    // Calculate duration
    let duration = start.elapsed().as_millis() as u64;

    // Determine success/error
    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    // Log the action (warns and continues if the log cannot be written)
    audit::log_action(&home, &cmd_name, args_json, success, error, duration);

    // Handle result
    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!(r#"{{"error": "{}"}}"#, e);
        }
        process::exit(1);
    }
}

fn run_command(
    command: Option<Commands>,
    home: &Path,
    human: bool,
) -> Result<(), rigging::Error> {
    match command {
        None => {
            let result = commands::status(home)?;
            output(&result, human);
        }

        Some(Commands::Init) => {
            let result = commands::init(home)?;
            output(&result, human);
        }

        Some(Commands::Version) => {
            let result = commands::version();
            output(&result, human);
        }

        Some(Commands::Schema { command }) => match command {
            SchemaCommands::Create {
                name,
                description,
                extends,
                variable,
            } => {
                let result = commands::schema_create(home, name, description, extends, variable)?;
                output(&result, human);
            }

            SchemaCommands::List => {
                let result = commands::schema_list(home)?;
                output(&result, human);
            }

            SchemaCommands::Show { name, resolved } => {
                let result = commands::schema_show(home, &name, resolved)?;
                output(&result, human);
            }

            SchemaCommands::Update {
                name,
                description,
                variable,
                remove_variable,
                extends,
            } => {
                let result = commands::schema_update(
                    home,
                    &name,
                    description,
                    variable,
                    remove_variable,
                    extends,
                )?;
                output(&result, human);
            }

            SchemaCommands::Delete { name, remote } => {
                let result = commands::schema_delete(home, &name, remote)?;
                output(&result, human);
            }
        },

        Some(Commands::Sheet { command }) => match command {
            SheetCommands::Create {
                name,
                schema,
                project,
                env,
                description,
                extends,
                value,
                import_env,
                import_json,
            } => {
                let spec = NewSheet {
                    name,
                    project,
                    environment: env,
                    schema,
                    description,
                    extends,
                    values: value,
                    import_env,
                    import_json,
                };
                let result = commands::sheet_create(home, spec)?;
                output(&result, human);
            }

            SheetCommands::List { project } => {
                let result = commands::sheet_list(home, project.as_deref())?;
                output(&result, human);
            }

            SheetCommands::Show {
                name,
                project,
                env,
                resolved,
                reveal,
            } => {
                let result = commands::sheet_show(
                    home,
                    name.as_deref(),
                    project.as_deref(),
                    env.as_deref(),
                    resolved,
                    reveal,
                )?;
                output(&result, human);
            }

            SheetCommands::Set { name, values } => {
                let result = commands::sheet_set(home, &name, values)?;
                output(&result, human);
            }

            SheetCommands::Unset { name, keys } => {
                let result = commands::sheet_unset(home, &name, keys)?;
                output(&result, human);
            }

            SheetCommands::Export {
                name,
                project,
                env,
                format,
                resolved,
                output: target,
            } => {
                let result = commands::sheet_export(
                    home,
                    name.as_deref(),
                    project.as_deref(),
                    env.as_deref(),
                    &format,
                    resolved,
                    target.as_deref(),
                )?;
                output(&result, human);
            }

            SheetCommands::Delete {
                name,
                project,
                env,
                remote,
            } => {
                let result = commands::sheet_delete(
                    home,
                    name.as_deref(),
                    project.as_deref(),
                    env.as_deref(),
                    remote,
                )?;
                output(&result, human);
            }
        },

        Some(Commands::Project { command }) => match command {
            ProjectCommands::Create {
                name,
                description,
                schema,
            } => {
                let result = commands::project_create(home, name, description, schema.as_deref())?;
                output(&result, human);
            }

            ProjectCommands::List => {
                let result = commands::project_list(home)?;
                output(&result, human);
            }

            ProjectCommands::Show { name } => {
                let result = commands::project_show(home, &name)?;
                output(&result, human);
            }

            ProjectCommands::Update {
                name,
                description,
                schema,
            } => {
                let result =
                    commands::project_update(home, &name, description, schema.as_deref())?;
                output(&result, human);
            }

            ProjectCommands::Delete { name, keep_sheets } => {
                let result = commands::project_delete(home, &name, keep_sheets)?;
                output(&result, human);
            }

            ProjectCommands::Env { command } => match command {
                EnvCommands::Add {
                    project,
                    env,
                    schema,
                } => {
                    let result =
                        commands::project_env_add(home, &project, &env, schema.as_deref())?;
                    output(&result, human);
                }

                EnvCommands::Remove { project, env } => {
                    let result = commands::project_env_remove(home, &project, &env)?;
                    output(&result, human);
                }

                EnvCommands::List { project } => {
                    let result = commands::project_env_list(home, &project)?;
                    output(&result, human);
                }
            },
        },

        Some(Commands::Verify {
            sheet,
            project,
            env,
            schema,
        }) => {
            let result = commands::verify(
                home,
                sheet.as_deref(),
                project.as_deref(),
                env.as_deref(),
                schema.as_deref(),
            )?;
            output(&result, human);
            if !result.ok {
                return Err(rigging::Error::Validation(format!(
                    "{} of {} targets failed",
                    result.failed, result.checked
                )));
            }
        }

        Some(Commands::Push {
            project,
            remote,
            dry_run,
            force,
        }) => {
            let result = commands::push(home, &project, remote.as_deref(), dry_run, force)?;
            output(&result, human);
        }

        Some(Commands::Pull {
            remote,
            schemas,
            sheets,
            dry_run,
            force,
        }) => {
            let result = commands::pull(home, remote.as_deref(), schemas, sheets, dry_run, force)?;
            output(&result, human);
        }

        Some(Commands::Remote { command }) => match command {
            RemoteCommands::Check { remote } => {
                let result = commands::remote_check(remote.as_deref())?;
                output(&result, human);
            }
        },

        Some(Commands::Store { command }) => match command {
            StoreCommands::Check => {
                let result = commands::store_check(home)?;
                output(&result, human);
            }
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Turn `KEY=value` arguments into a JSON map so the audit log can mask
/// by variable name.
fn pairs_json(pairs: &[String]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) => {
                map.insert(key.trim().to_string(), serde_json::Value::from(value));
            }
            None => {
                map.insert(pair.clone(), serde_json::Value::Null);
            }
        }
    }
    serde_json::Value::Object(map)
}

fn serialize_command(command: &Option<Commands>) -> (String, serde_json::Value) {
    match command {
        None => ("status".to_string(), serde_json::json!({})),

        Some(Commands::Init) => ("init".to_string(), serde_json::json!({})),

        Some(Commands::Version) => ("version".to_string(), serde_json::json!({})),

        Some(Commands::Schema { command }) => match command {
            SchemaCommands::Create {
                name,
                description,
                extends,
                variable,
            } => (
                "schema create".to_string(),
                serde_json::json!({
                    "name": name,
                    "description": description,
                    "extends": extends,
                    "variable": variable,
                }),
            ),
            SchemaCommands::List => ("schema list".to_string(), serde_json::json!({})),
            SchemaCommands::Show { name, resolved } => (
                "schema show".to_string(),
                serde_json::json!({ "name": name, "resolved": resolved }),
            ),
            SchemaCommands::Update {
                name,
                description,
                variable,
                remove_variable,
                extends,
            } => (
                "schema update".to_string(),
                serde_json::json!({
                    "name": name,
                    "description": description,
                    "variable": variable,
                    "remove_variable": remove_variable,
                    "extends": extends,
                }),
            ),
            SchemaCommands::Delete { name, remote } => (
                "schema delete".to_string(),
                serde_json::json!({ "name": name, "remote": remote }),
            ),
        },

        Some(Commands::Sheet { command }) => match command {
            SheetCommands::Create {
                name,
                schema,
                project,
                env,
                description,
                extends,
                value,
                import_env,
                import_json,
            } => (
                "sheet create".to_string(),
                serde_json::json!({
                    "name": name,
                    "schema": schema,
                    "project": project,
                    "env": env,
                    "description": description,
                    "extends": extends,
                    "values": pairs_json(value),
                    "import_env": import_env,
                    "import_json": import_json,
                }),
            ),
            SheetCommands::List { project } => (
                "sheet list".to_string(),
                serde_json::json!({ "project": project }),
            ),
            SheetCommands::Show {
                name,
                project,
                env,
                resolved,
                reveal,
            } => (
                "sheet show".to_string(),
                serde_json::json!({
                    "name": name,
                    "project": project,
                    "env": env,
                    "resolved": resolved,
                    "reveal": reveal,
                }),
            ),
            SheetCommands::Set { name, values } => (
                "sheet set".to_string(),
                serde_json::json!({ "name": name, "values": pairs_json(values) }),
            ),
            SheetCommands::Unset { name, keys } => (
                "sheet unset".to_string(),
                serde_json::json!({ "name": name, "keys": keys }),
            ),
            SheetCommands::Export {
                name,
                project,
                env,
                format,
                resolved,
                output,
            } => (
                "sheet export".to_string(),
                serde_json::json!({
                    "name": name,
                    "project": project,
                    "env": env,
                    "format": format,
                    "resolved": resolved,
                    "output": output,
                }),
            ),
            SheetCommands::Delete {
                name,
                project,
                env,
                remote,
            } => (
                "sheet delete".to_string(),
                serde_json::json!({
                    "name": name,
                    "project": project,
                    "env": env,
                    "remote": remote,
                }),
            ),
        },

        Some(Commands::Project { command }) => match command {
            ProjectCommands::Create {
                name,
                description,
                schema,
            } => (
                "project create".to_string(),
                serde_json::json!({
                    "name": name,
                    "description": description,
                    "schema": schema,
                }),
            ),
            ProjectCommands::List => ("project list".to_string(), serde_json::json!({})),
            ProjectCommands::Show { name } => (
                "project show".to_string(),
                serde_json::json!({ "name": name }),
            ),
            ProjectCommands::Update {
                name,
                description,
                schema,
            } => (
                "project update".to_string(),
                serde_json::json!({
                    "name": name,
                    "description": description,
                    "schema": schema,
                }),
            ),
            ProjectCommands::Delete { name, keep_sheets } => (
                "project delete".to_string(),
                serde_json::json!({ "name": name, "keep_sheets": keep_sheets }),
            ),
            ProjectCommands::Env { command } => match command {
                EnvCommands::Add {
                    project,
                    env,
                    schema,
                } => (
                    "project env add".to_string(),
                    serde_json::json!({
                        "project": project,
                        "env": env,
                        "schema": schema,
                    }),
                ),
                EnvCommands::Remove { project, env } => (
                    "project env remove".to_string(),
                    serde_json::json!({ "project": project, "env": env }),
                ),
                EnvCommands::List { project } => (
                    "project env list".to_string(),
                    serde_json::json!({ "project": project }),
                ),
            },
        },

        Some(Commands::Verify {
            sheet,
            project,
            env,
            schema,
        }) => (
            "verify".to_string(),
            serde_json::json!({
                "sheet": sheet,
                "project": project,
                "env": env,
                "schema": schema,
            }),
        ),

        Some(Commands::Push {
            project,
            remote,
            dry_run,
            force,
        }) => (
            "push".to_string(),
            serde_json::json!({
                "project": project,
                "remote": remote,
                "dry_run": dry_run,
                "force": force,
            }),
        ),

        Some(Commands::Pull {
            remote,
            schemas,
            sheets,
            dry_run,
            force,
        }) => (
            "pull".to_string(),
            serde_json::json!({
                "remote": remote,
                "schemas": schemas,
                "sheets": sheets,
                "dry_run": dry_run,
                "force": force,
            }),
        ),

        Some(Commands::Remote { command }) => match command {
            RemoteCommands::Check { remote } => (
                "remote check".to_string(),
                serde_json::json!({ "remote": remote }),
            ),
        },

        Some(Commands::Store { command }) => match command {
            StoreCommands::Check => ("store check".to_string(), serde_json::json!({})),
        },
    }
}

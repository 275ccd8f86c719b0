//! Pull remote entities into the local catalog.
//!
//! Schemas come down before config sheets so sheet references land after
//! the schemas they point at. Entities are matched by guid; a remote
//! entity nobody has locally is created, a known one is overwritten when
//! [`should_pull`] says the remote copy wins, and everything else is
//! counted as skipped.

use chrono::{DateTime, Utc};

use crate::remote::convert::{self, should_pull};
use crate::remote::{RemoteApi, SheetFilter};
use crate::store::{Catalog, Record, Store};
use crate::sync::{PullReport, SyncAction};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct PullOptions {
    /// Pull schemas (on by default).
    pub schemas: bool,
    /// Pull config sheets (on by default).
    pub sheets: bool,
    /// Plan and report without writing to the catalog.
    pub dry_run: bool,
    /// Overwrite local copies even when they are newer.
    pub force: bool,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            schemas: true,
            sheets: true,
            dry_run: false,
            force: false,
        }
    }
}

/// Pull schemas and config sheets from the remote into the catalog.
///
/// A failed write aborts the pull; entities already written stay.
pub fn pull(
    catalog: &Catalog,
    remote: &dyn RemoteApi,
    remote_url: &str,
    opts: PullOptions,
) -> Result<PullReport> {
    let mut report = PullReport::new(remote_url, opts.dry_run);

    if opts.schemas {
        for dto in remote.list_schemas()? {
            let incoming = convert::schema_from_wire(&dto, remote_url);
            pull_entity(
                &catalog.schemas,
                incoming,
                dto.updated_at.time(),
                opts,
                &mut report,
            )?;
        }
    }

    if opts.sheets {
        for dto in remote.list_sheets(&SheetFilter::default())? {
            let incoming = convert::sheet_from_wire(&dto, remote_url);
            pull_entity(
                &catalog.sheets,
                incoming,
                dto.updated_at.time(),
                opts,
                &mut report,
            )?;
        }
    }

    Ok(report)
}

fn pull_entity<T: Record>(
    store: &Store<T>,
    incoming: T,
    remote_time: Option<DateTime<Utc>>,
    opts: PullOptions,
    report: &mut PullReport,
) -> Result<()> {
    let name = incoming.entity().name.clone();
    let id = incoming.entity().id.clone();

    match store.load(&id) {
        Err(Error::NotFound(_)) => {
            report.record(T::LABEL, &name, &id, SyncAction::Create);
            if !opts.dry_run {
                store.save(&incoming)?;
            }
        }
        Err(e) => return Err(e),
        Ok(local) => {
            if should_pull(Some(local.entity().updated_at), remote_time, opts.force) {
                report.record(T::LABEL, &name, &id, SyncAction::Update);
                if !opts.dry_run {
                    store.save(&incoming)?;
                }
            } else {
                report.record(T::LABEL, &name, &id, SyncAction::Skip);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VarKind, Variable};
    use crate::remote::convert::{schema_to_wire, sheet_to_wire};
    use crate::remote::wire::ApiTime;
    use crate::test_utils::{FakeRemote, TestEnv, make_schema, make_sheet};
    use chrono::Duration;

    const REMOTE: &str = "https://acme.example.com/api";

    fn seed_remote(remote: &FakeRemote) -> (String, String) {
        let schema = make_schema(
            "web",
            vec![Variable::new("PORT".to_string(), VarKind::Number)],
            vec![],
        );
        let schema_guid = schema.entity.id.clone();
        remote.schemas.borrow_mut().push(schema_to_wire(&schema));

        let sheet = make_sheet("shop-prod", None, &[("PORT", "8080")]);
        let sheet_guid = sheet.entity.id.clone();
        remote
            .sheets
            .borrow_mut()
            .push(sheet_to_wire(&sheet, "p-1", &schema_guid));

        (schema_guid, sheet_guid)
    }

    #[test]
    fn test_pull_creates_missing_entities() {
        let env = TestEnv::new();
        let catalog = env.catalog();
        let remote = FakeRemote::new();
        let (schema_guid, sheet_guid) = seed_remote(&remote);

        let report = pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.skipped, 0);

        let schema = catalog.schemas.load(&schema_guid).unwrap();
        assert!(!schema.entity.local);
        assert_eq!(schema.entity.remote.as_deref(), Some(REMOTE));

        let sheet = catalog.sheets.load(&sheet_guid).unwrap();
        assert_eq!(sheet.values.get("PORT").unwrap(), "8080");
    }

    #[test]
    fn test_pull_schemas_arrive_before_sheets() {
        let env = TestEnv::new();
        let catalog = env.catalog();
        let remote = FakeRemote::new();
        seed_remote(&remote);

        let report = pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();
        assert_eq!(report.changes[0].kind, "schema");
        assert_eq!(report.changes[1].kind, "config sheet");
    }

    #[test]
    fn test_pulled_sheet_keeps_its_links() {
        let env = TestEnv::new();
        let catalog = env.catalog();
        let remote = FakeRemote::new();
        let (schema_guid, sheet_guid) = seed_remote(&remote);

        pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();

        let sheet = catalog.sheets.load(&sheet_guid).unwrap();
        assert_eq!(sheet.schema.as_ref().unwrap().target(), Some(schema_guid.as_str()));
        assert_eq!(sheet.project.as_deref(), Some("p-1"));
    }

    #[test]
    fn test_pull_updates_when_remote_newer() {
        let env = TestEnv::new();
        let catalog = env.catalog();

        let local = catalog
            .schemas
            .create(make_schema("web", vec![], vec![]))
            .unwrap();

        let mut newer = local.clone();
        newer
            .variables
            .push(Variable::new("PORT".to_string(), VarKind::Number));
        newer.entity.updated_at += Duration::seconds(30);
        let remote = FakeRemote::new();
        remote.schemas.borrow_mut().push(schema_to_wire(&newer));

        let report = pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(catalog.schemas.get("web").unwrap().variables.len(), 1);
    }

    #[test]
    fn test_pull_skips_when_local_newer() {
        let env = TestEnv::new();
        let catalog = env.catalog();

        let local = catalog
            .schemas
            .create(make_schema("web", vec![], vec![]))
            .unwrap();

        let mut older = local.clone();
        older
            .variables
            .push(Variable::new("PORT".to_string(), VarKind::Number));
        older.entity.updated_at -= Duration::seconds(30);
        let remote = FakeRemote::new();
        remote.schemas.borrow_mut().push(schema_to_wire(&older));

        let report = pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();
        assert_eq!(report.skipped, 1);
        assert!(catalog.schemas.get("web").unwrap().variables.is_empty());
    }

    #[test]
    fn test_pull_force_overwrites_newer_local() {
        let env = TestEnv::new();
        let catalog = env.catalog();

        let local = catalog
            .schemas
            .create(make_schema("web", vec![], vec![]))
            .unwrap();

        let mut older = local.clone();
        older
            .variables
            .push(Variable::new("PORT".to_string(), VarKind::Number));
        older.entity.updated_at -= Duration::seconds(30);
        let remote = FakeRemote::new();
        remote.schemas.borrow_mut().push(schema_to_wire(&older));

        let opts = PullOptions {
            force: true,
            ..PullOptions::default()
        };
        let report = pull(&catalog, &remote, REMOTE, opts).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(catalog.schemas.get("web").unwrap().variables.len(), 1);
    }

    #[test]
    fn test_pull_equal_timestamps_count_as_remote_wins() {
        // Within the skew window the remote copy is taken, so a pull right
        // after a push rewrites rather than skips.
        let env = TestEnv::new();
        let catalog = env.catalog();

        let local = catalog
            .schemas
            .create(make_schema("web", vec![], vec![]))
            .unwrap();
        let remote = FakeRemote::new();
        remote.schemas.borrow_mut().push(schema_to_wire(&local));

        let report = pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_pull_undated_remote_copy_skips() {
        let env = TestEnv::new();
        let catalog = env.catalog();

        let local = catalog
            .schemas
            .create(make_schema("web", vec![], vec![]))
            .unwrap();

        let mut dto = schema_to_wire(&local);
        dto.updated_at = ApiTime::default();
        let remote = FakeRemote::new();
        remote.schemas.borrow_mut().push(dto);

        let report = pull(&catalog, &remote, REMOTE, PullOptions::default()).unwrap();
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_pull_dry_run_writes_nothing() {
        let env = TestEnv::new();
        let catalog = env.catalog();
        let remote = FakeRemote::new();
        let (schema_guid, _) = seed_remote(&remote);

        let opts = PullOptions {
            dry_run: true,
            ..PullOptions::default()
        };
        let report = pull(&catalog, &remote, REMOTE, opts).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.created, 2);
        assert!(catalog.schemas.load(&schema_guid).is_err());
        assert!(catalog.sheets.list().unwrap().is_empty());
    }

    #[test]
    fn test_pull_schemas_only() {
        let env = TestEnv::new();
        let catalog = env.catalog();
        let remote = FakeRemote::new();
        seed_remote(&remote);

        let opts = PullOptions {
            sheets: false,
            ..PullOptions::default()
        };
        let report = pull(&catalog, &remote, REMOTE, opts).unwrap();

        assert_eq!(report.created, 1);
        assert!(catalog.sheets.list().unwrap().is_empty());
        assert_eq!(catalog.schemas.list().unwrap().len(), 1);
    }
}

use dataseed::{
    DataMigration, HistoryRecord, HistoryStore, Mappable, MemoryContext, MemoryHistoryStore,
    MigrationConfiguration, MigrationContext, MigrationOutcome, MigrationRunner, MigrationSet,
    QueryResult, SeedConfig, SeedError, SeedExt, SqlExecutor, SqlHistoryStore, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

const CONTEXT_KEY: &str = "shop::migrations::Configuration";

type CallLog = Rc<RefCell<Vec<String>>>;

/// Records apply/cleanup calls in a shared log.
struct Tracked {
    name: &'static str,
    order: i32,
    always_run: bool,
    fail: bool,
    log: CallLog,
}

impl Tracked {
    fn new(name: &'static str, order: i32, log: &CallLog) -> Self {
        Self {
            name,
            order,
            always_run: false,
            fail: false,
            log: Rc::clone(log),
        }
    }
}

impl<C: ?Sized> DataMigration<C> for Tracked {
    fn order(&self) -> i32 {
        self.order
    }

    fn migration_id(&self) -> String {
        self.name.to_string()
    }

    fn always_run(&self) -> bool {
        self.always_run
    }

    fn apply(&self, _context: &mut C) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("apply:{}", self.name));
        if self.fail {
            anyhow::bail!("{} exploded", self.name);
        }
        Ok(())
    }

    fn cleanup(&self, _context: &mut C) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("cleanup:{}", self.name));
        Ok(())
    }
}

fn boxed<C: ?Sized>(units: Vec<Tracked>) -> Vec<Box<dyn DataMigration<C>>> {
    units
        .into_iter()
        .map(|unit| Box::new(unit) as Box<dyn DataMigration<C>>)
        .collect()
}

#[test]
fn test_applies_in_ascending_order() {
    let log = CallLog::default();
    let mut context = MemoryContext::new();
    let runner = MigrationRunner::new(CONTEXT_KEY);

    let units = vec![
        Tracked::new("third", 3, &log),
        Tracked::new("first", 1, &log),
        Tracked::new("second", 2, &log),
    ];
    let report = runner.apply_all(&mut context, boxed(units)).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["apply:first", "apply:second", "apply:third"]
    );
    assert_eq!(report.applied(), vec!["first", "second", "third"]);
    assert_eq!(report.context_key, CONTEXT_KEY);
}

#[test]
fn test_equal_orders_keep_input_sequence() {
    let log = CallLog::default();
    let mut context = MemoryContext::new();
    let units = vec![
        Tracked::new("b", 1, &log),
        Tracked::new("a", 1, &log),
        Tracked::new("c", 0, &log),
    ];

    MigrationRunner::new(CONTEXT_KEY)
        .apply_all(&mut context, boxed(units))
        .unwrap();

    assert_eq!(*log.borrow(), vec!["apply:c", "apply:b", "apply:a"]);
}

#[test]
fn test_second_run_only_cleans_up() {
    let log = CallLog::default();
    let mut context = MemoryContext::new();
    let runner = MigrationRunner::new(CONTEXT_KEY);

    runner
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();
    let report = runner
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();

    assert_eq!(*log.borrow(), vec!["apply:seed", "cleanup:seed"]);
    assert_eq!(report.entries[0].outcome, MigrationOutcome::Skipped);
    assert_eq!(context.history().count("seed", CONTEXT_KEY), 1);
    assert_eq!(context.history().len(), 1);
}

#[test]
fn test_history_is_scoped_by_context_key() {
    let log = CallLog::default();
    let mut context = MemoryContext::new();

    MigrationRunner::new("one::Configuration")
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();
    MigrationRunner::new("two::Configuration")
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();

    assert_eq!(*log.borrow(), vec!["apply:seed", "apply:seed"]);
    assert_eq!(context.history().len(), 2);
}

#[test]
fn test_always_run_reapplies_without_new_record() {
    let log = CallLog::default();
    let mut context = MemoryContext::new();
    let runner = MigrationRunner::new(CONTEXT_KEY);

    for _ in 0..2 {
        let mut unit = Tracked::new("refresh", 1, &log);
        unit.always_run = true;
        runner.apply_all(&mut context, boxed(vec![unit])).unwrap();
    }

    assert_eq!(
        *log.borrow(),
        vec!["apply:refresh", "cleanup:refresh", "apply:refresh"]
    );
    assert_eq!(context.history().count("refresh", CONTEXT_KEY), 1);
}

#[test]
fn test_failure_stops_the_run_and_is_not_recorded() {
    let log = CallLog::default();
    let mut context = MemoryContext::new();
    let runner = MigrationRunner::new(CONTEXT_KEY);

    let mut broken = Tracked::new("broken", 2, &log);
    broken.fail = true;
    let units = vec![
        Tracked::new("ok", 1, &log),
        broken,
        Tracked::new("later", 3, &log),
    ];

    let err = runner.apply_all(&mut context, boxed(units)).unwrap_err();
    match err {
        SeedError::Migration { migration, .. } => assert_eq!(migration, "broken"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*log.borrow(), vec!["apply:ok", "apply:broken"]);
    assert!(context.history().count("ok", CONTEXT_KEY) == 1);
    assert_eq!(context.history().count("broken", CONTEXT_KEY), 0);

    // the next run picks up where the last one failed
    let report = runner
        .apply_all(
            &mut context,
            boxed(vec![
                Tracked::new("ok", 1, &log),
                Tracked::new("broken", 2, &log),
                Tracked::new("later", 3, &log),
            ]),
        )
        .unwrap();
    assert_eq!(report.skipped(), vec!["ok"]);
    assert_eq!(report.applied(), vec!["broken", "later"]);
}

/// History store whose inserts fail, simulating a crash between apply and record.
#[derive(Default)]
struct FlakyHistory {
    inner: MemoryHistoryStore,
    fail_next_record: bool,
}

impl HistoryStore for FlakyHistory {
    fn ensure_schema(&mut self) -> dataseed::Result<()> {
        self.inner.ensure_schema()
    }

    fn contains(&mut self, migration_id: &str, context_key: &str) -> dataseed::Result<bool> {
        self.inner.contains(migration_id, context_key)
    }

    fn record(&mut self, record: HistoryRecord) -> dataseed::Result<()> {
        if std::mem::take(&mut self.fail_next_record) {
            return Err(SeedError::History("connection lost".to_string()));
        }
        self.inner.record(record)
    }

    fn records(&mut self) -> dataseed::Result<Vec<HistoryRecord>> {
        self.inner.records()
    }
}

struct FlakyContext {
    history: FlakyHistory,
}

impl MigrationContext for FlakyContext {
    fn history_store(&mut self) -> &mut dyn HistoryStore {
        &mut self.history
    }
}

#[test]
fn test_lost_record_reapplies_on_next_run() {
    let log = CallLog::default();
    let mut context = FlakyContext {
        history: FlakyHistory {
            fail_next_record: true,
            ..Default::default()
        },
    };
    let runner = MigrationRunner::new(CONTEXT_KEY);

    let result = runner.apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]));
    assert!(matches!(result, Err(SeedError::History(_))));

    runner
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();

    // at-least-once: the body ran twice, the history holds one row
    assert_eq!(*log.borrow(), vec!["apply:seed", "apply:seed"]);
    assert_eq!(context.history.inner.count("seed", CONTEXT_KEY), 1);
}

#[derive(Mappable, Debug, Clone, Default)]
struct Category {
    #[mapping(key)]
    id: i32,
    title: String,
}

struct SeedCategories;

impl DataMigration<MemoryContext> for SeedCategories {
    fn order(&self) -> i32 {
        10
    }

    fn apply(&self, context: &mut MemoryContext) -> anyhow::Result<()> {
        for (id, title) in [(1, "Books"), (2, "Music")] {
            let value = Category {
                id: 0,
                title: title.to_string(),
            };
            context.add_or_update(value, &[Value::Integer(id)])?;
        }
        Ok(())
    }
}

struct RenameMusic;

impl DataMigration<MemoryContext> for RenameMusic {
    fn order(&self) -> i32 {
        20
    }

    fn apply(&self, context: &mut MemoryContext) -> anyhow::Result<()> {
        let value = Category {
            id: 0,
            title: "Music & Audio".to_string(),
        };
        context.add_or_update(value, &[Value::Integer(2)])?;
        Ok(())
    }
}

struct ShopConfiguration;

impl MigrationConfiguration for ShopConfiguration {
    type Context = MemoryContext;

    fn migrations(&self) -> MigrationSet<MemoryContext> {
        MigrationSet::new().with(RenameMusic).with(SeedCategories)
    }
}

#[test]
fn test_configuration_seed_runs_owned_migrations() {
    let mut context = MemoryContext::new();
    context.register::<Category>().unwrap();

    let report = ShopConfiguration.seed(&mut context).unwrap();
    assert_eq!(report.applied(), vec!["seedcategories", "renamemusic"]);
    assert!(report.context_key.ends_with("ShopConfiguration"));

    let mut titles: Vec<String> = context
        .rows::<Category>()
        .unwrap()
        .iter()
        .map(|c| format!("{}:{}", c.id, c.title))
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["1:Books", "2:Music & Audio"]);

    let report = ShopConfiguration.seed(&mut context).unwrap();
    assert!(report.applied().is_empty());
    assert_eq!(report.skipped().len(), 2);
}

/// Minimal SQL surface that understands only the history statements.
#[derive(Default)]
struct HistoryTableExecutor {
    table_created: bool,
    rows: Vec<(String, String)>,
    statements: Vec<String>,
}

#[async_trait::async_trait]
impl SqlExecutor for HistoryTableExecutor {
    async fn query(&mut self, sql: &str, params: &[Value]) -> dataseed::Result<QueryResult> {
        self.statements.push(sql.to_string());
        if !self.table_created {
            return Err(SeedError::Execution("no such table".to_string()));
        }
        let rows = self
            .rows
            .iter()
            .filter(|(id, key)| match params {
                [Value::Text(p_id), Value::Text(p_key)] => id == p_id && key == p_key,
                _ => true,
            })
            .map(|(id, key)| vec![Value::from(id.as_str()), Value::from(key.as_str())])
            .collect();
        Ok(QueryResult::new(
            vec!["MigrationId".to_string(), "ContextKey".to_string()],
            rows,
        ))
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> dataseed::Result<u64> {
        self.statements.push(sql.to_string());
        if sql.starts_with("CREATE TABLE") {
            self.table_created = true;
            return Ok(0);
        }
        match params {
            [Value::Text(id), Value::Text(key)] if self.table_created => {
                self.rows.push((id.clone(), key.clone()));
                Ok(1)
            }
            _ => Err(SeedError::Execution(format!("unexpected statement: {sql}"))),
        }
    }
}

struct SqlContext {
    history: SqlHistoryStore<HistoryTableExecutor>,
}

impl MigrationContext for SqlContext {
    fn history_store(&mut self) -> &mut dyn HistoryStore {
        &mut self.history
    }
}

#[test]
fn test_runner_over_sql_history_store() {
    let config = SeedConfig::new().ensure_history_table(true);
    let history = SqlHistoryStore::new(HistoryTableExecutor::default(), &config).unwrap();
    let mut context = SqlContext { history };
    let runner = MigrationRunner::new(CONTEXT_KEY).with_config(config);
    let log = CallLog::default();

    runner
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();
    let report = runner
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]))
        .unwrap();

    assert_eq!(report.skipped(), vec!["seed"]);
    assert_eq!(*log.borrow(), vec!["apply:seed", "cleanup:seed"]);
    assert_eq!(
        context.history.records().unwrap(),
        vec![HistoryRecord::new("seed", CONTEXT_KEY)]
    );
    assert!(context.history.executor().statements[0].starts_with("CREATE TABLE IF NOT EXISTS"));
}

#[test]
fn test_missing_history_table_propagates() {
    let config = SeedConfig::new();
    let history = SqlHistoryStore::new(HistoryTableExecutor::default(), &config).unwrap();
    let mut context = SqlContext { history };
    let log = CallLog::default();

    let result = MigrationRunner::new(CONTEXT_KEY)
        .with_config(config)
        .apply_all(&mut context, boxed(vec![Tracked::new("seed", 1, &log)]));

    assert!(matches!(result, Err(SeedError::Execution(_))));
    assert!(log.borrow().is_empty());
}

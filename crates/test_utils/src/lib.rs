pub mod fixtures;
pub mod remotes;

/// Route `log` records to the test harness. Safe to call from every test.
pub fn init_test_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

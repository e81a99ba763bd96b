pub mod constant {
    pub const ENGINE: &str = "powerset"; // "powerset" or "adjacency"

    pub const VOLUME_BUDGET: f64 = 9_600.0; // cargo hold of the hauler
    pub const TIME_BUDGET_SECONDS: u64 = 60;
    pub const MAX_SEGMENT_LENGTH: u32 = 12;
    pub const MAX_PRIORITY_DISTANCE: u32 = 5;
    pub const PRIORITY_DECAY: f64 = 0.5;
    pub const SOLUTIONS_CAP: usize = 500_000;

    // trade hub defaults, overridden by STARTING_SYSTEM_ID / STARTING_SITE_ID
    pub const STARTING_SYSTEM_ID: u32 = 30_002_659;
    pub const STARTING_SITE_ID: u64 = 60_011_866;

    pub const FRONTIER_CSV_PATH: &str = "frontier.csv";

    // offline fallback scenario when no static data store is available
    pub const FIXTURE_SYSTEM_COUNT: usize = 60;
    pub const FIXTURE_SITE_COUNT: usize = 25;
    pub const FIXTURE_SEED: u64 = 12345;
}

pub mod cargo_env {
    pub const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
}

pub mod common {
    /// Directory searched for class manifests when nothing else is configured.
    pub const DEFAULT_ROOT: &str = "t/lib";
    pub const DEFAULT_METHOD_PREFIX: &str = "test_";
    pub const DEFAULT_EXTENSIONS: [&str; 4] = ["yaml", "yml", "toml", "json"];
    /// Base name of the optional settings file looked up in the working directory.
    pub const SETTINGS_FILE_NAME: &str = "classtest";
    pub const ENV_PREFIX: &str = "CLASSTEST";
    pub const MAX_CALL_DEPTH: usize = 32;
}

pub mod lifecycle {
    /// Method names that would shadow a lifecycle hook.
    pub const RESERVED_METHOD_NAMES: [&str; 4] = [
        "test_startup",
        "test_setup",
        "test_teardown",
        "test_shutdown",
    ];
    pub const NO_METHODS_SELECTED: &str = "no test methods selected";
}

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const TEST_FAILURE: i32 = 1;
    pub const STRUCTURAL_ERROR: i32 = 2;
    pub const INTERRUPTED: i32 = 130;
}

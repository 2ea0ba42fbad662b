pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FORMAT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_COMPILER: &str = "g++";
pub const DEFAULT_FORMATTER: &str = "clang-format";
pub const DEFAULT_CPP_STANDARDS: [&str; 4] = ["c++11", "c++14", "c++17", "c++20"];
pub const DEFAULT_TEST_STANDARD: &str = "c++20";

/// Upper bound on draining pipes and reaping a child after it was killed.
pub const POST_KILL_GRACE_MS: u64 = 500;

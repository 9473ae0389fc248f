// Exit codes for scripted runs
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_DEVICE_FAIL: i32 = 2;

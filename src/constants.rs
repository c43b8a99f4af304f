/// Storage keys and roster defaults shared across extraction and publishing.

// Object keys (without prefix or extension)
pub const STAFF_KEY: &str = "kt_staff";
pub const STUDENTS_KEY: &str = "kt_students";
pub const AUTHORIZED_PHONES_KEY: &str = "kt_authorized_phones";

// OSS defaults
pub const DEFAULT_REGION: &str = "oss-cn-beijing";
pub const DEFAULT_PREFIX: &str = "jinxing-edu";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 300;
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Page size requested from the bucket listing API (its maximum).
pub const LIST_MAX_KEYS: usize = 1000;

/// Date layout the OSS signature scheme expects, always rendered in UTC.
pub const OSS_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// Environment variables
pub const ENV_ACCESS_KEY_ID: &str = "OSS_ACCESS_KEY_ID";
pub const ENV_ACCESS_KEY_SECRET: &str = "OSS_ACCESS_KEY_SECRET";
pub const ENV_REGION: &str = "OSS_REGION";
pub const ENV_BUCKET: &str = "OSS_BUCKET";
pub const ENV_ENDPOINT: &str = "OSS_ENDPOINT";
pub const ENV_PREFIX: &str = "OSS_PREFIX";
pub const ENV_TIMEOUT_SECONDS: &str = "OSS_TIMEOUT_SECONDS";

pub const DEFAULT_CONFIG_PATH: &str = "roster.toml";

// Staff sheet
pub const STAFF_HEADER_ROW: usize = 1;
/// Header label of the name column. A data row carrying this value is a leaked header.
pub const STAFF_NAME_HEADER: &str = "姓名";
pub const DEFAULT_STAFF_ROLE: &str = "教师";
pub const STAFF_ID_PREFIX: &str = "staff_";

// Student sheets
pub const STUDENT_HEADER_ROW: usize = 0;
pub const STUDENT_ID_PREFIX: &str = "stu_";
pub const FEMALE: &str = "女";
pub const MALE: &str = "男";

/// Shortest phone accepted onto the authorized list (mainland mobile numbers are 11 digits).
pub const MIN_AUTHORIZED_PHONE_LEN: usize = 11;

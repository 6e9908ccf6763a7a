/// Security code, e.g. `600519`.
pub const FIELD_SECCODE: &str = "SECCODE";
/// Security short name.
pub const FIELD_SECNAME: &str = "SECNAME";
/// Disclosure (announcement) date.
pub const FIELD_DECLAREDATE: &str = "DECLAREDATE";
/// Date the holding actually changed.
pub const FIELD_VARYDATE: &str = "VARYDATE";
/// Holder name.
pub const FIELD_HOLDER: &str = "F002V";
/// Change amount, in shares.
pub const FIELD_CHANGE: &str = "F004N";

pub const DEFAULT_BASE_URL: &str = "http://www.cninfo.com.cn/data20/shareholeder";
pub const DEFAULT_TIME_MARK: &str = "oneMonth";
pub const DEFAULT_CARD_URL: &str =
    "http://www.cninfo.com.cn/new/commonUrl?url=data/person-stock-data-tables";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CONFIG_FILE: &str = "cninfo-watch.toml";
pub const WEBHOOK_ENV: &str = "WECHAT_WEBHOOK";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const REFERER: &str = DEFAULT_CARD_URL;
pub const ORIGIN: &str = "http://www.cninfo.com.cn";
pub const ACCEPT: &str = "application/json, text/plain, */*";

/// The API reports success in the body, independent of the HTTP status.
pub const API_OK_CODE: i64 = 200;

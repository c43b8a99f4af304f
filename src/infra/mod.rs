pub mod http_client;
pub mod workbook_reader;

pub use http_client::ReqwestHttp;
pub use workbook_reader::CalamineWorkbook;

pub mod tier;

pub use tier::{
    download_pdf, request_upgrade, DownloadError, ReportAction, ReportView, UpgradeError,
    UpgradeResult,
};

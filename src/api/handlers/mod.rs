mod admin;
mod media;
mod settings;
mod static_files;

pub use admin::{admin_purge, health};
pub use media::{
    analyze_media, apply_media_analysis, batch_update_media, check_media, gallery, get_media,
    list_folders, list_media, scan_import, scan_preview, update_media, upload_many_media,
    upload_media,
};
pub use settings::{
    admin_list_settings, admin_save_settings, get_setting, get_settings, put_setting,
    save_settings,
};
pub use static_files::{serve_media, serve_upload};

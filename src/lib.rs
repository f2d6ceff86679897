//! `confguard` applies PHP runtime limits to a site's configuration files
//! (`wp-config.php`, `php.ini`, `.htaccess`) through marker-delimited managed blocks,
//! with backups, validation, rollback and multi-strategy fallback. It also carries a
//! size-rotating log writer for the site's append-only logs.

pub mod logger;

pub mod error;
pub mod libs;
pub mod schemas;

// Library root
// -----------
// Pushes the files of one local directory to the `/docs/` folder of the
// image-hosting service. The binary (`main.rs`) reads the configuration
// and runs the pipeline in `sync`.
//
// Module responsibilities:
// - `config`: environment variables and the fixed remote folder.
// - `api`: blocking HTTP calls to the service (token, readdir, mkdir,
//   upload) behind the `ImageHost` trait.
// - `sync`: authenticate, ensure the folder, upload every file.
// - `error`: the `SyncError` taxonomy and exit codes.
// - `logging`: stderr diagnostics via `tracing`.
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod sync;

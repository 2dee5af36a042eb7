//! daytrack main entrypoint.

use daytrack::errors::AppError;
use daytrack::run;
use daytrack::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(&e);
        if matches!(e, AppError::VersionBlocked(_) | AppError::SchemaTooNew { .. }) {
            error("Close other daytrack instances or update the application, then retry.");
        }
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}

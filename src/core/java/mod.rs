pub mod runtime;

pub use runtime::find_java;
pub use runtime::probe_java;
pub use runtime::JavaInstallation;

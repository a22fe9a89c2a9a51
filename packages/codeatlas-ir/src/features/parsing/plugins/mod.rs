//! Language plugins

mod c_cpp;
mod go;
mod java;
mod kotlin;
mod python;
mod rust_lang;
mod typescript;

pub use c_cpp::{CPlugin, CppPlugin};
pub use go::GoPlugin;
pub use java::JavaPlugin;
pub use kotlin::KotlinPlugin;
pub use python::PythonPlugin;
pub use rust_lang::RustPlugin;
pub use typescript::{JavaScriptPlugin, TypeScriptPlugin};

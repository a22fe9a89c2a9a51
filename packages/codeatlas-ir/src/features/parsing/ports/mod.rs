//! Parsing ports

mod language_plugin;

pub use language_plugin::{
    is_test_path, module_path_from_layout, HeritageInfo, ImportInfo, LanguageId, LanguagePlugin,
    ParamInfo,
};

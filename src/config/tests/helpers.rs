//! Layer builders for configuration tests.

use ortho_config::MergeComposer;
use serde_json::Value;

use crate::PatchTesterConfig;

/// One configuration source, in the order ortho-config merges them.
pub enum Layer {
    Defaults(Value),
    File(Value),
    Environment(Value),
    Cli(Value),
}

/// Merges `layers` in sequence, later layers winning.
pub fn compose(layers: Vec<Layer>) -> PatchTesterConfig {
    let mut composer = MergeComposer::new();
    for layer in layers {
        match layer {
            Layer::Defaults(value) => composer.push_defaults(value),
            Layer::File(value) => composer.push_file(value, None),
            Layer::Environment(value) => composer.push_environment(value),
            Layer::Cli(value) => composer.push_cli(value),
        }
    }

    PatchTesterConfig::merge_from_layers(composer.layers()).expect("layers should merge")
}

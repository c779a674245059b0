//! Prints the Module CustomResourceDefinition as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/module.yaml`

use anyhow::Result;
use crds::Module;
use kube::CustomResourceExt;

fn main() -> Result<()> {
    let crd = serde_yaml::to_string(&Module::crd())?;
    print!("{crd}");
    Ok(())
}

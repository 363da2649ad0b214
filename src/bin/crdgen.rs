//! # CRD Generator
//!
//! Prints the `CopyRequest` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/copyrequest.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::CustomResourceExt;
use s3_copy_controller::crd::CopyRequest;

fn main() -> anyhow::Result<()> {
    let crd = CopyRequest::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}

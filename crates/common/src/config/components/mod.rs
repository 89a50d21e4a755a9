pub mod definition;
pub mod provisioner;

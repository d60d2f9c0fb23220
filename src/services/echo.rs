//! `Echo` service, assembled from a method table.

use serde::{Deserialize, Serialize};

use crate::rpc::ServiceMethods;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SayArgs {
    pub text: String,
}

pub fn service() -> ServiceMethods {
    ServiceMethods::new("Echo")
        .method("Say", |args: SayArgs| Ok::<_, String>(args))
        .method_without_params("Ping", || Ok::<_, String>("pong"))
        .procedure("Log", |args: SayArgs| {
            tracing::info!(text = %args.text, "Echo.Log");
            Ok::<_, String>(())
        })
}

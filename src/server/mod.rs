//! gRPC server and generated proto types.
//!
//! This module provides:
//! - Generated protobuf types (`proto`) for Envoy ext_proc v3 and
//!   `grpc.health.v1`
//! - Conversions between proto and native message types (`convert`)
//! - The ext_proc service implementation (`service`)
//! - The liveness service (`health`)
//! - Daemon configuration (`config`, server-only)

#[cfg(feature = "server")]
pub mod config;
pub mod convert;
pub mod health;
pub mod service;

/// Re-exported generated proto types.
///
/// Module nesting mirrors the proto packages so cross-package references
/// in the generated code resolve.
pub mod proto {
    pub mod envoy {
        pub mod config {
            pub mod core {
                pub mod v3 {
                    tonic::include_proto!("envoy.config.core.v3");
                }
            }
        }

        pub mod r#type {
            pub mod v3 {
                tonic::include_proto!("envoy.r#type.v3");
            }
        }

        pub mod service {
            pub mod ext_proc {
                pub mod v3 {
                    tonic::include_proto!("envoy.service.ext_proc.v3");
                }
            }
        }
    }

    pub mod grpc {
        pub mod health {
            pub mod v1 {
                tonic::include_proto!("grpc.health.v1");
            }
        }
    }

    pub use envoy::service::ext_proc::v3 as ext_proc;
    pub use grpc::health::v1 as health;
}

pub use health::HealthService;
pub use service::ExtProcService;

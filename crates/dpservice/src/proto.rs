//! Generated gRPC bindings for the dataplane service.

#![allow(clippy::all)]

tonic::include_proto!("dpdkironcore.v1");

//! # IO Module
//!
//! Adapter between HTTP clients and the domain services. Handlers decode
//! requests, call one service method and translate the outcome into a
//! status code and JSON body; no business rules live here.

pub mod rest;

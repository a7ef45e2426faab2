// ─── Forge Installer Core ───
// Resolution, download and post-processing of Forge versions on top of a
// minimal vanilla version installer.
//
// Architecture:
//   core/
//     version/    — Mojang manifest + version JSON + OS rules + install flow
//     maven/      — Artifact coordinates, maven-metadata.xml
//     downloader/ — Concurrent downloads with SHA-1 validation
//     loaders/    — Version hooks: vanilla and forge
//     java/       — Java runtime discovery for installer processors
//     config.rs   — Persistent installer settings
//     http.rs     — Shared HTTP client
//     vars.rs     — `{NAME}` template substitution

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod java;
pub mod loaders;
pub mod maven;
pub mod vars;
pub mod version;

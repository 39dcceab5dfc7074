// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration specs for the meeting-video pipeline.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/chapters.rs"]
mod chapters;
#[path = "specs/pipeline.rs"]
mod pipeline;
#[path = "specs/playlists.rs"]
mod playlists;
#[path = "specs/server.rs"]
mod server;

// Wire contract between the editor and the remote template store.

pub mod api;

//! Binary entrypoint for the in-memory bridge backend.

use std::process::ExitCode;

use vcsbridge_backend_memory::MemoryBackend;

fn main() -> ExitCode {
    vcsbridged::run(MemoryBackend::default())
}

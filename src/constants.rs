/// Contract deployed when no `--contract` is given.
pub const DEFAULT_CONTRACT: &str = "MetaChess";

/// Hardhat's default artifacts directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Hardhat and anvil both listen here by default.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8545";

/// `_format` tag of the artifacts we know how to read.
pub const ARTIFACT_FORMAT: &str = "hh-sol-artifact-1";

/// Solidity build metadata, not contract artifacts.
pub const BUILD_INFO_DIR: &str = "build-info";

pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// Init code limit from EIP-3860, in KiB.
pub const MAX_INIT_CODE_SIZE: u64 = 48;

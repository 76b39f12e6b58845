//! 技术指纹引擎：静态签名表、编译器、匹配器、版本快照

pub mod compiler;
pub mod detector;
pub mod signatures;
pub mod versions;

pub use self::compiler::{
    BUILTIN_SIGNATURES, CompiledRule, CompiledSignature, CompiledSignatureLibrary, Matcher, SignatureCompiler,
};
pub use self::detector::{DETECTION_THRESHOLD, DetectionInput, TechDetector};
pub use self::signatures::{RuleKind, SignatureRule, TECH_SIGNATURES, TechSignature};
pub use self::versions::{LATEST_VERSIONS, check_outdated, latest_version, normalize_version};

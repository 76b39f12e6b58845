//! 网络访问层：HTTP 探测、TLS 证书检查、DoH 查询

pub mod doh;
pub mod headers;
pub mod probe;
pub mod tls;

pub use self::doh::{DohResolver, RecordType};
pub use self::headers::ResponseHeaders;
pub use self::probe::{FetchedPage, HttpProbe, ProbeResponse};
pub use self::tls::{CertificateDetails, TlsInspector, TlsProbeError};

use std::io::{Cursor, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bitflags::bitflags;
use bytes::Bytes;
use headers::Header;
use time::format_description::well_known::Rfc3339;
use time::macros::offset;

use crate::errors::DavError;
use crate::DavResult;

/// HTTP methods supported by the handler, including the webdav ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    Head,
    Get,
    Put,
    Options,
    PropFind,
    PropPatch,
    MkCol,
    Copy,
    Move,
    Delete,
    Lock,
    Unlock,
}

impl DavMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DavMethod::Head => "HEAD",
            DavMethod::Get => "GET",
            DavMethod::Put => "PUT",
            DavMethod::Options => "OPTIONS",
            DavMethod::PropFind => "PROPFIND",
            DavMethod::PropPatch => "PROPPATCH",
            DavMethod::MkCol => "MKCOL",
            DavMethod::Copy => "COPY",
            DavMethod::Move => "MOVE",
            DavMethod::Delete => "DELETE",
            DavMethod::Lock => "LOCK",
            DavMethod::Unlock => "UNLOCK",
        }
    }

    fn flag(&self) -> DavMethodSet {
        match self {
            DavMethod::Head => DavMethodSet::HEAD,
            DavMethod::Get => DavMethodSet::GET,
            DavMethod::Put => DavMethodSet::PUT,
            DavMethod::Options => DavMethodSet::OPTIONS,
            DavMethod::PropFind => DavMethodSet::PROPFIND,
            DavMethod::PropPatch => DavMethodSet::PROPPATCH,
            DavMethod::MkCol => DavMethodSet::MKCOL,
            DavMethod::Copy => DavMethodSet::COPY,
            DavMethod::Move => DavMethodSet::MOVE,
            DavMethod::Delete => DavMethodSet::DELETE,
            DavMethod::Lock => DavMethodSet::LOCK,
            DavMethod::Unlock => DavMethodSet::UNLOCK,
        }
    }
}

bitflags! {
    /// A set of methods, used to enable or disable handler methods.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DavMethodSet: u32 {
        const HEAD = 0x0001;
        const GET = 0x0002;
        const PUT = 0x0004;
        const OPTIONS = 0x0008;
        const PROPFIND = 0x0010;
        const PROPPATCH = 0x0020;
        const MKCOL = 0x0040;
        const COPY = 0x0080;
        const MOVE = 0x0100;
        const DELETE = 0x0200;
        const LOCK = 0x0400;
        const UNLOCK = 0x0800;

        const HTTP_RO = Self::HEAD.bits() | Self::GET.bits() | Self::OPTIONS.bits();
        const HTTP_RW = Self::HTTP_RO.bits() | Self::PUT.bits();
        const WEBDAV_RO = Self::HTTP_RO.bits() | Self::PROPFIND.bits();
    }
}

impl DavMethodSet {
    pub const WEBDAV_RW: Self = Self::all();

    pub fn contains_method(&self, m: DavMethod) -> bool {
        self.contains(m.flag())
    }
}

// translate method into our own enum that has webdav methods as well.
pub fn dav_method(m: &http::Method) -> DavResult<DavMethod> {
    let m = match *m {
        http::Method::HEAD => DavMethod::Head,
        http::Method::GET => DavMethod::Get,
        http::Method::PUT => DavMethod::Put,
        http::Method::DELETE => DavMethod::Delete,
        http::Method::OPTIONS => DavMethod::Options,
        _ => match m.as_str() {
            "PROPFIND" => DavMethod::PropFind,
            "PROPPATCH" => DavMethod::PropPatch,
            "MKCOL" => DavMethod::MkCol,
            "COPY" => DavMethod::Copy,
            "MOVE" => DavMethod::Move,
            "LOCK" => DavMethod::Lock,
            "UNLOCK" => DavMethod::Unlock,
            _ => {
                return Err(DavError::UnknownDavMethod);
            }
        },
    };
    Ok(m)
}

pub fn systemtime_to_offsetdatetime(t: SystemTime) -> time::OffsetDateTime {
    match t.duration_since(UNIX_EPOCH) {
        Ok(t) => {
            let tm = time::OffsetDateTime::from_unix_timestamp(t.as_secs() as i64).unwrap();
            tm.to_offset(offset!(UTC))
        }
        Err(_) => time::OffsetDateTime::UNIX_EPOCH.to_offset(offset!(UTC)),
    }
}

pub fn systemtime_to_httpdate(t: SystemTime) -> String {
    let d = headers::Date::from(t);
    let mut v = Vec::new();
    d.encode(&mut v);
    v[0].to_str().unwrap().to_owned()
}

pub fn systemtime_to_rfc3339(t: SystemTime) -> String {
    // 1996-12-19T16:39:57Z
    systemtime_to_offsetdatetime(t).format(&Rfc3339).unwrap()
}

// A buffer that implements "Write", for the xml event writers.
#[derive(Clone)]
pub struct MemBuffer(Cursor<Vec<u8>>);

impl MemBuffer {
    pub fn new() -> MemBuffer {
        MemBuffer(Cursor::new(Vec::new()))
    }

    pub fn take(&mut self) -> Bytes {
        let buf = std::mem::take(self.0.get_mut());
        self.0.set_position(0);
        Bytes::from(buf)
    }
}

impl Default for MemBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

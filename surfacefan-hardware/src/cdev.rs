//! SAM character device transport
//!
//! Talks to the Surface Aggregator Module through the `surface_aggregator_cdev`
//! misc device (normally `/dev/surface/aggregator`). Each request is a single
//! `SSAM_CDEV_REQUEST` ioctl carrying the full request and response buffers.

use crate::channel::{Request, Transport};
use async_trait::async_trait;
use nix::errno::Errno;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use surfacefan_core::TransportError;
use tracing::debug;

/// Request flag: the caller expects response data
const REQUEST_HAS_RESPONSE: u16 = 0x01;

/// Response buffer size handed to the kernel
const RESPONSE_CAPACITY: usize = 32;

/// Buffer descriptor inside a cdev request
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
struct SsamCdevBuffer {
    data: u64,
    length: u16,
    pad: [u8; 6],
}

/// `struct ssam_cdev_request` from the kernel uapi header
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
struct SsamCdevRequest {
    target_category: u8,
    target_id: u8,
    command_id: u8,
    instance_id: u8,
    flags: u16,
    status: i16,
    payload: SsamCdevBuffer,
    response: SsamCdevBuffer,
}

nix::ioctl_readwrite!(ssam_cdev_request, 0xA5, 1, SsamCdevRequest);

/// Map an open/ioctl errno to a transport error
///
/// A missing or not-yet-bound device node means the aggregator has not been
/// enumerated yet.
fn map_errno(errno: Errno, context: &str) -> TransportError {
    match errno {
        Errno::ENOENT | Errno::ENODEV | Errno::ENXIO => {
            TransportError::NotYetEnumerated(format!("{}: {}", context, errno.desc()))
        }
        Errno::ETIMEDOUT => TransportError::Timeout(context.to_string()),
        other => TransportError::Io(format!("{}: {}", context, other.desc())),
    }
}

/// Map the request status written back by the kernel
fn map_status(status: i16) -> Result<(), TransportError> {
    if status >= 0 {
        return Ok(());
    }
    if -i32::from(status) == Errno::ETIMEDOUT as i32 {
        Err(TransportError::Timeout("remote controller did not answer".to_string()))
    } else {
        Err(TransportError::Device(i32::from(status)))
    }
}

/// Transport over the SAM character device
pub struct CdevTransport {
    file: Arc<File>,
    path: PathBuf,
}

impl CdevTransport {
    /// Open the character device at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e: io::Error| match e.raw_os_error() {
                Some(code) => map_errno(Errno::from_raw(code), &path.display().to_string()),
                None => TransportError::from(e),
            })?;

        debug!("Opened SAM character device {}", path.display());

        Ok(Self {
            file: Arc::new(file),
            path,
        })
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for CdevTransport {
    async fn request(&mut self, request: &Request) -> Result<Vec<u8>, TransportError> {
        let file = Arc::clone(&self.file);
        let expects_response = request.expects_response;
        let request = request.clone();

        let (status, mut response) = tokio::task::spawn_blocking(move || {
            let mut payload = request.payload;
            let mut response = vec![0u8; RESPONSE_CAPACITY];

            let mut raw = SsamCdevRequest {
                target_category: request.endpoint.target_category,
                target_id: request.endpoint.target_id,
                command_id: request.command_id,
                instance_id: request.endpoint.instance_id,
                flags: if request.expects_response {
                    REQUEST_HAS_RESPONSE
                } else {
                    0
                },
                status: 0,
                payload: SsamCdevBuffer {
                    data: if payload.is_empty() {
                        0
                    } else {
                        payload.as_mut_ptr() as u64
                    },
                    length: payload.len() as u16,
                    pad: [0; 6],
                },
                response: SsamCdevBuffer {
                    data: response.as_mut_ptr() as u64,
                    length: RESPONSE_CAPACITY as u16,
                    pad: [0; 6],
                },
            };

            // SAFETY: both buffers outlive the call and their lengths match
            // the descriptors passed to the kernel.
            unsafe { ssam_cdev_request(file.as_raw_fd(), &mut raw) }
                .map_err(|errno| map_errno(errno, "SSAM_CDEV_REQUEST"))?;

            let status = raw.status;
            let length = usize::from(raw.response.length).min(RESPONSE_CAPACITY);
            response.truncate(length);
            Ok::<_, TransportError>((status, response))
        })
        .await
        .map_err(|e| TransportError::Io(format!("ioctl task failed: {}", e)))??;

        map_status(status)?;

        if !expects_response {
            response.clear();
        }
        debug!("SAM status {} ({} response bytes)", status, response.len());
        Ok(response)
    }

    fn describe(&self) -> String {
        format!("SAM cdev {}", self.path().display())
    }
}

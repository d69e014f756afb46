//! Channel for remote speed requests
//!
//! A [`Channel`] turns the two logical fan operations into requests for one
//! remote endpoint and decodes the responses. Framing the request on a bus is
//! left to a [`Transport`].

use async_trait::async_trait;
use surfacefan_core::profile::{COMMAND_GET_SPEED, COMMAND_SET_SPEED};
use surfacefan_core::{
    speed_from_wire, speed_to_wire, EndpointId, Fault, Result, SpeedValue, TransportError,
    SPEED_WIRE_LEN,
};
use tokio::sync::Mutex;
use tracing::debug;

/// One logical request to a remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Addressed endpoint
    pub endpoint: EndpointId,
    /// Command id within the target category
    pub command_id: u8,
    /// Request payload (empty for reads)
    pub payload: Vec<u8>,
    /// Whether the endpoint answers with data
    pub expects_response: bool,
}

impl Request {
    /// Zero-payload request answered with data
    pub fn read(endpoint: EndpointId, command_id: u8) -> Self {
        Self {
            endpoint,
            command_id,
            payload: Vec::new(),
            expects_response: true,
        }
    }

    /// Request carrying a payload, answered without data
    pub fn write(endpoint: EndpointId, command_id: u8, payload: Vec<u8>) -> Self {
        Self {
            endpoint,
            command_id,
            payload,
            expects_response: false,
        }
    }
}

/// Trait for request transport abstraction
///
/// A transport performs exactly one synchronous round trip per call and
/// returns the raw response bytes. Timeouts are its own concern and surface
/// as [`TransportError::Timeout`]. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response
    async fn request(&mut self, request: &Request) -> std::result::Result<Vec<u8>, TransportError>;

    /// Short description for logs (device path, "simulated", ...)
    fn describe(&self) -> String;
}

/// Speed channel bound to one remote endpoint
///
/// The transport sits behind an async mutex: the remote endpoint accepts one
/// outstanding transaction at a time, so concurrent callers are serialized
/// here.
pub struct Channel<T: Transport + ?Sized = dyn Transport> {
    transport: Mutex<Box<T>>,
    endpoint: EndpointId,
    writable: bool,
}

impl<T: Transport + ?Sized> Channel<T> {
    /// Create a channel for `endpoint`
    ///
    /// `writable` is false for read-only variants; `set_speed` then fails
    /// locally with `Fault::Unsupported`.
    pub fn new(transport: Box<T>, endpoint: EndpointId, writable: bool) -> Self {
        Self {
            transport: Mutex::new(transport),
            endpoint,
            writable,
        }
    }

    /// Endpoint this channel is bound to
    pub fn endpoint(&self) -> EndpointId {
        self.endpoint
    }

    /// Whether `set_speed` is permitted
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Perform one round trip
    async fn transact(&self, request: &Request) -> Result<Vec<u8>> {
        let mut transport = self.transport.lock().await;

        debug!(
            "Request to {} via {}: cmd=0x{:02x} payload={:02x?}",
            request.endpoint,
            transport.describe(),
            request.command_id,
            request.payload
        );

        let response = transport.request(request).await?;
        debug!("Response: {:02x?}", response);
        Ok(response)
    }

    /// Read the current fan speed
    pub async fn get_speed(&self) -> Result<SpeedValue> {
        let request = Request::read(self.endpoint, COMMAND_GET_SPEED);
        let response = self.transact(&request).await?;

        speed_from_wire(&response).ok_or_else(|| {
            Fault::Transport(TransportError::Protocol(format!(
                "expected {} response bytes, got {}",
                SPEED_WIRE_LEN,
                response.len()
            )))
        })
    }

    /// Write a fan speed setpoint
    pub async fn set_speed(&self, value: SpeedValue) -> Result<()> {
        if !self.writable {
            return Err(Fault::Unsupported("set_speed on a read-only channel"));
        }

        let request = Request::write(
            self.endpoint,
            COMMAND_SET_SPEED,
            speed_to_wire(value).to_vec(),
        );
        self.transact(&request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    /// Mock transport for testing Channel without hardware
    struct MockTransport {
        /// Queued responses to return
        responses: VecDeque<std::result::Result<Vec<u8>, TransportError>>,
        /// Record of requests sent
        sent: Arc<StdMutex<Vec<Request>>>,
    }

    impl MockTransport {
        fn new(sent: Arc<StdMutex<Vec<Request>>>) -> Self {
            Self {
                responses: VecDeque::new(),
                sent,
            }
        }

        fn queue(mut self, response: std::result::Result<Vec<u8>, TransportError>) -> Self {
            self.responses.push_back(response);
            self
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn request(
            &mut self,
            request: &Request,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Io("No response queued".to_string())))
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    fn channel(mock: MockTransport, writable: bool) -> Channel<MockTransport> {
        Channel::new(Box::new(mock), EndpointId::SURFACE_FAN, writable)
    }

    #[tokio::test]
    async fn test_get_speed_decodes_little_endian() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent.clone()).queue(Ok(vec![0x94, 0x11]));

        let channel = channel(mock, false);
        assert_eq!(channel.get_speed().await.unwrap(), 4500);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].command_id, 0x01);
        assert!(sent[0].payload.is_empty());
        assert!(sent[0].expects_response);
        assert_eq!(sent[0].endpoint, EndpointId::SURFACE_FAN);
    }

    #[tokio::test]
    async fn test_get_speed_rejects_short_response() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent).queue(Ok(vec![0x94]));

        let result = channel(mock, false).get_speed().await;
        assert!(matches!(
            result,
            Err(Fault::Transport(TransportError::Protocol(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_speed_transport_failure() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent).queue(Err(TransportError::Timeout("read".into())));

        let result = channel(mock, false).get_speed().await;
        assert!(matches!(
            result,
            Err(Fault::Transport(TransportError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_set_speed_encodes_little_endian() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent.clone()).queue(Ok(Vec::new()));

        channel(mock, true).set_speed(3000).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].command_id, 0x0b);
        assert_eq!(sent[0].payload, vec![0xB8, 0x0B]);
        assert!(!sent[0].expects_response);
    }

    #[tokio::test]
    async fn test_set_speed_read_only_channel() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent.clone());

        let result = channel(mock, false).set_speed(3000).await;
        assert!(matches!(result, Err(Fault::Unsupported(_))));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_speed_transport_failure() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent).queue(Err(TransportError::Device(-5)));

        let result = channel(mock, true).set_speed(3000).await;
        assert_eq!(
            result,
            Err(Fault::Transport(TransportError::Device(-5)))
        );
    }

    #[tokio::test]
    async fn test_no_retry_on_failure() {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let mock = MockTransport::new(sent.clone())
            .queue(Err(TransportError::Timeout("first".into())))
            .queue(Ok(vec![0x00, 0x10]));

        let channel = channel(mock, false);
        assert!(channel.get_speed().await.is_err());
        assert_eq!(sent.lock().unwrap().len(), 1);

        assert_eq!(channel.get_speed().await.unwrap(), 0x1000);
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_request_shapes() {
        let read = Request::read(EndpointId::SURFACE_FAN, 0x01);
        assert!(read.payload.is_empty());
        assert!(read.expects_response);

        let write = Request::write(EndpointId::SURFACE_FAN, 0x0b, vec![0xFF, 0xFF]);
        assert_eq!(write.payload.len(), 2);
        assert!(!write.expects_response);
    }
}

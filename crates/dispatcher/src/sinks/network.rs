//! NetworkSink - UDP streaming of gesture output
//!
//! One datagram per frame. Consumers that only react to gestures and the
//! continuous directional signals can ask for the compact `event` payload
//! instead of the full frame.

use contracts::{ContractError, GestureFrame, GestureKind, GestureSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, instrument, warn};

const DEFAULT_MAX_PACKET_SIZE: usize = 65000;

/// Serialization format for network transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFormat {
    #[default]
    Json,
    /// Compact binary, for consumers sharing the frame types
    Bincode,
}

/// What each datagram carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkPayload {
    /// The whole [`GestureFrame`]
    #[default]
    Frame,
    /// A [`GestureDatagram`]: gesture plus directional output
    Event,
}

/// Compact per-cycle message for control surfaces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureDatagram {
    pub cycle: u64,
    pub timestamp: Option<f64>,
    pub gesture: GestureKind,
    pub intensity: Option<f64>,
    pub confidence: Option<f64>,
    pub magnitude: f64,
    pub tilt: [f64; 3],
    pub moving: bool,
}

impl From<&GestureFrame> for GestureDatagram {
    fn from(frame: &GestureFrame) -> Self {
        Self {
            cycle: frame.cycle,
            timestamp: frame.timestamp,
            gesture: frame.event.kind,
            intensity: frame.event.intensity,
            confidence: frame.event.confidence,
            magnitude: frame.directional.calibrated_magnitude,
            tilt: frame.directional.tilt,
            moving: frame.directional.is_moving,
        }
    }
}

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    pub addr: SocketAddr,
    pub format: NetworkFormat,
    pub payload: NetworkPayload,
    /// Datagrams above this size are never sent
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            format: NetworkFormat::default(),
            payload: NetworkPayload::default(),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    /// Read `addr`, `format` (json | bincode), `payload` (frame | event) and
    /// `max_packet_size`
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;
        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{addr_str}': {e}"))?;

        let format = match params.get("format").map(String::as_str) {
            Some("bincode") => NetworkFormat::Bincode,
            Some("json") | None => NetworkFormat::Json,
            Some(other) => return Err(format!("unknown format '{other}'")),
        };

        let payload = match params.get("payload").map(String::as_str) {
            Some("event") => NetworkPayload::Event,
            Some("frame") | None => NetworkPayload::Frame,
            Some(other) => return Err(format!("unknown payload '{other}'")),
        };

        let max_packet_size = match params.get("max_packet_size") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid max_packet_size '{s}': {e}"))?,
            None => DEFAULT_MAX_PACKET_SIZE,
        };

        Ok(Self {
            addr,
            format,
            payload,
            max_packet_size,
        })
    }
}

/// Sink that sends one datagram per frame
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: Option<UdpSocket>,
    sent: u64,
    /// Frames sent without their recorded feature vector to fit the limit
    trimmed: u64,
}

impl NetworkSink {
    #[instrument(name = "network_sink_new", skip(name, config))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let bind_addr = if config.addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(&config.addr).await?;

        debug!(
            sink = %name,
            target = %config.addr,
            payload = ?config.payload,
            "NetworkSink connected"
        );

        Ok(Self {
            name,
            config,
            socket: Some(socket),
            sent: 0,
            trimmed: 0,
        })
    }

    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn trimmed(&self) -> u64 {
        self.trimmed
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ContractError> {
        match self.config.format {
            NetworkFormat::Json => serde_json::to_vec(value)
                .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}"))),
            NetworkFormat::Bincode => bincode::serialize(value)
                .map_err(|e| ContractError::sink_write(&self.name, format!("bincode error: {e}"))),
        }
    }

    /// Encode a frame within `max_packet_size`.
    ///
    /// A full frame that is too large is retried without its feature row,
    /// which is the only unbounded part. Anything still too large is an error
    /// so it is counted as a failed write.
    fn datagram(&mut self, frame: &GestureFrame) -> Result<Vec<u8>, ContractError> {
        let max = self.config.max_packet_size;
        let mut data = match self.config.payload {
            NetworkPayload::Event => self.encode(&GestureDatagram::from(frame))?,
            NetworkPayload::Frame => self.encode(frame)?,
        };

        if data.len() > max && self.config.payload == NetworkPayload::Frame && frame.features.is_some()
        {
            let bare = GestureFrame {
                features: None,
                ..frame.clone()
            };
            data = self.encode(&bare)?;
            if data.len() <= max {
                self.trimmed += 1;
                debug!(sink = %self.name, cycle = frame.cycle, "Feature row dropped to fit datagram");
            }
        }

        if data.len() > max {
            warn!(
                sink = %self.name,
                cycle = frame.cycle,
                gesture = %frame.event.kind,
                size = data.len(),
                max,
                "Datagram too large, not sent"
            );
            return Err(ContractError::sink_write(
                &self.name,
                format!("datagram of {} bytes exceeds limit of {max}", data.len()),
            ));
        }
        Ok(data)
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "socket not connected"))
    }
}

impl GestureSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_write",
        skip(self, frame),
        fields(sink = %self.name, cycle = frame.cycle)
    )]
    async fn write(&mut self, frame: &GestureFrame) -> Result<(), ContractError> {
        let data = self.datagram(frame)?;

        match self.socket()?.send(&data).await {
            Ok(bytes) => {
                self.sent += 1;
                debug!(sink = %self.name, cycle = frame.cycle, bytes, "Sent");
            }
            // UDP is best effort; a missing listener is not a sink failure
            Err(e) => error!(sink = %self.name, error = %e, "UDP send failed"),
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(
            sink = %self.name,
            sent = self.sent,
            trimmed = self.trimmed,
            "NetworkSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::tests::make_frame;
    use crate::handle::SinkHandle;
    use contracts::{FeatureVector, LabeledFeatures};

    async fn bound_receiver() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.unwrap()
    }

    async fn recv_json<T: serde::de::DeserializeOwned>(socket: &UdpSocket) -> T {
        let mut buf = vec![0u8; 65536];
        let len = socket.recv(&mut buf).await.unwrap();
        serde_json::from_slice(&buf[..len]).unwrap()
    }

    fn with_features(cycle: u64) -> GestureFrame {
        let mut frame = make_frame(cycle, GestureKind::TapHard);
        frame.features = Some(LabeledFeatures {
            label: "tap_hard".to_string(),
            features: FeatureVector::default(),
        });
        frame
    }

    #[test]
    fn test_network_sink_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());
        params.insert("format".to_string(), "bincode".to_string());
        params.insert("payload".to_string(), "event".to_string());

        let config = NetworkSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.format, NetworkFormat::Bincode);
        assert_eq!(config.payload, NetworkPayload::Event);
        assert_eq!(config.max_packet_size, DEFAULT_MAX_PACKET_SIZE);

        params.insert("payload".to_string(), "raw".to_string());
        assert!(NetworkSinkConfig::from_params(&params).is_err());
        params.remove("payload");
        params.insert("format".to_string(), "xml".to_string());
        assert!(NetworkSinkConfig::from_params(&params).is_err());
        assert!(NetworkSinkConfig::from_params(&HashMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_frame_payload_delivers_json() {
        let receiver = bound_receiver().await;
        let config = NetworkSinkConfig::new(receiver.local_addr().unwrap());

        let mut sink = NetworkSink::new("test_net", config).await.unwrap();
        sink.write(&make_frame(3, GestureKind::WaveHorizontal))
            .await
            .unwrap();

        let frame: GestureFrame = recv_json(&receiver).await;
        assert_eq!(frame.cycle, 3);
        assert_eq!(frame.event.kind, GestureKind::WaveHorizontal);
        assert_eq!(sink.sent(), 1);
    }

    #[tokio::test]
    async fn test_event_payload_is_compact() {
        let receiver = bound_receiver().await;
        let config = NetworkSinkConfig {
            payload: NetworkPayload::Event,
            ..NetworkSinkConfig::new(receiver.local_addr().unwrap())
        };

        let mut sink = NetworkSink::new("osc_bridge", config).await.unwrap();
        let frame = with_features(9);
        sink.write(&frame).await.unwrap();

        let datagram: GestureDatagram = recv_json(&receiver).await;
        assert_eq!(datagram, GestureDatagram::from(&frame));
        assert_eq!(datagram.gesture, GestureKind::TapHard);
    }

    #[tokio::test]
    async fn test_feature_row_shed_to_fit() {
        let receiver = bound_receiver().await;
        let bare_len = serde_json::to_vec(&make_frame(5, GestureKind::TapHard))
            .unwrap()
            .len();
        let config = NetworkSinkConfig {
            max_packet_size: bare_len,
            ..NetworkSinkConfig::new(receiver.local_addr().unwrap())
        };

        let mut sink = NetworkSink::new("tight", config).await.unwrap();
        sink.write(&with_features(5)).await.unwrap();

        let frame: GestureFrame = recv_json(&receiver).await;
        assert_eq!(frame.event.kind, GestureKind::TapHard);
        assert!(frame.features.is_none());
        assert_eq!(sink.trimmed(), 1);
        assert_eq!(sink.sent(), 1);
    }

    #[tokio::test]
    async fn test_oversized_datagram_counted_as_failure() {
        let config = NetworkSinkConfig {
            max_packet_size: 8,
            ..NetworkSinkConfig::new("127.0.0.1:19998".parse().unwrap())
        };

        let mut sink = NetworkSink::new("tiny", config.clone()).await.unwrap();
        assert!(sink.write(&make_frame(1, GestureKind::None)).await.is_err());
        assert_eq!(sink.sent(), 0);

        let handle = SinkHandle::spawn(NetworkSink::new("tiny", config).await.unwrap(), 4);
        handle.try_send(make_frame(2, GestureKind::Hold));
        let metrics = std::sync::Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(metrics.failure_count(), 1);
        assert_eq!(metrics.write_count(), 0);
    }
}

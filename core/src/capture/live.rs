use std::io;

use badcapt_common::config::CaptureOptions;
use badcapt_common::error::CaptureError;
use badcapt_common::packet::{CaptureInfo, Packet};
use badcapt_protocols::decode_frame;
use chrono::Utc;
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, NetworkInterface};
use tracing::{debug, info};

use super::PacketSource;

/// Frames read off a network interface through a pnet datalink channel.
pub struct LiveCapture {
    interface: String,
    rx: Box<dyn DataLinkReceiver>,
    snaplen: usize,
}

impl LiveCapture {
    /// Opens `interface` for capture. Fails if it does not exist or cannot
    /// be opened (usually for lack of privileges).
    pub fn open(interface: &str, options: &CaptureOptions) -> Result<Self, CaptureError> {
        let intf: NetworkInterface = datalink::interfaces()
            .into_iter()
            .find(|candidate| candidate.name == interface)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface.to_string()))?;

        Self::open_with(&intf, options, datalink::channel)
    }

    fn open_with<F>(intf: &NetworkInterface, options: &CaptureOptions, channel_opener: F) -> Result<Self, CaptureError>
    where
        F: FnOnce(&NetworkInterface, Config) -> io::Result<Channel>,
    {
        let ch: Channel = channel_opener(intf, channel_config(options)).map_err(|source| CaptureError::Open {
            name: intf.name.clone(),
            source,
        })?;

        match ch {
            Channel::Ethernet(_, rx) => {
                info!(
                    "Capturing on {} (snaplen {}, promiscuous {})",
                    intf.name, options.snaplen, options.promiscuous
                );
                Ok(Self::from_receiver(&intf.name, rx, options.snaplen))
            }
            #[allow(unreachable_patterns)]
            _ => Err(CaptureError::UnsupportedChannel(intf.name.clone())),
        }
    }

    fn from_receiver(interface: &str, rx: Box<dyn DataLinkReceiver>, snaplen: usize) -> Self {
        Self {
            interface: interface.to_string(),
            rx,
            snaplen,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

fn channel_config(options: &CaptureOptions) -> Config {
    Config {
        read_buffer_size: options.snaplen,
        read_timeout: options.read_timeout,
        promiscuous: options.promiscuous,
        ..Default::default()
    }
}

impl PacketSource for LiveCapture {
    fn next_packet(&mut self) -> Result<Option<Packet>, CaptureError> {
        match self.rx.next() {
            Ok(frame) => {
                let captured: &[u8] = &frame[..frame.len().min(self.snaplen)];
                let info: CaptureInfo = CaptureInfo::new(Utc::now(), captured.len(), frame.len());
                Ok(Some(decode_frame(captured, info)))
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Err(CaptureError::Timeout)
            }
            Err(e) => Err(CaptureError::Read(e)),
        }
    }

    fn close(&mut self) {
        debug!("Closing capture on {}", self.interface);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use badcapt_protocols::frame::{self, Ipv4Header, TcpHeader};
    use pnet::datalink::dummy;
    use std::collections::VecDeque;

    /// Hands out scripted reads, then times out forever.
    struct ScriptedReceiver {
        reads: VecDeque<io::Result<Vec<u8>>>,
        current: Vec<u8>,
    }

    impl DataLinkReceiver for ScriptedReceiver {
        fn next(&mut self) -> io::Result<&[u8]> {
            match self.reads.pop_front() {
                Some(Ok(frame)) => {
                    self.current = frame;
                    Ok(&self.current)
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "quiet")),
            }
        }
    }

    fn capture(reads: Vec<io::Result<Vec<u8>>>, snaplen: usize) -> LiveCapture {
        let rx = ScriptedReceiver {
            reads: reads.into(),
            current: Vec::new(),
        };
        LiveCapture::from_receiver("eth0", Box::new(rx), snaplen)
    }

    fn syn_frame() -> Vec<u8> {
        let ip: Ipv4Header = Ipv4Header::new("10.0.0.5".parse().unwrap(), "203.0.113.9".parse().unwrap());
        frame::create_tcp_frame(&ip, &TcpHeader::syn(51413, 23, 1), &[]).unwrap()
    }

    #[test]
    fn open_with_should_succeed_on_ethernet_channel() {
        let dummy_intf: NetworkInterface = dummy::dummy_interface(0);
        let mock_opener_success = |i: &NetworkInterface, _cfg: Config| -> io::Result<Channel> {
            dummy::channel(i, dummy::Config::default())
        };

        let result = LiveCapture::open_with(&dummy_intf, &CaptureOptions::default(), mock_opener_success);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().interface(), "eth0");
    }

    #[test]
    fn open_with_should_fail_on_io_error() {
        let dummy_intf: NetworkInterface = dummy::dummy_interface(0);
        let mock_opener_fail = |_: &NetworkInterface, _: Config| -> io::Result<Channel> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "Mock I/O Error"))
        };

        let result = LiveCapture::open_with(&dummy_intf, &CaptureOptions::default(), mock_opener_fail);
        match result {
            Err(CaptureError::Open { name, source }) => {
                assert_eq!(name, "eth0");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            Err(other) => panic!("expected an open error, got {other:?}"),
            Ok(_) => panic!("Test failed: expected Err, got Ok"),
        }
    }

    #[test]
    fn open_with_should_pass_capture_options_to_channel() {
        let dummy_intf: NetworkInterface = dummy::dummy_interface(1);
        let options: CaptureOptions = CaptureOptions {
            snaplen: 96,
            promiscuous: false,
            read_timeout: None,
        };
        let checking_opener = |i: &NetworkInterface, cfg: Config| -> io::Result<Channel> {
            assert_eq!(cfg.read_buffer_size, 96);
            assert!(!cfg.promiscuous);
            assert!(cfg.read_timeout.is_none());
            dummy::channel(i, dummy::Config::default())
        };

        assert!(LiveCapture::open_with(&dummy_intf, &options, checking_opener).is_ok());
    }

    #[test]
    fn open_should_reject_unknown_interface() {
        let result = LiveCapture::open("badcapt-no-such-if0", &CaptureOptions::default());
        assert!(matches!(result, Err(CaptureError::InterfaceNotFound(_))));
    }

    #[test]
    fn next_packet_should_decode_frames() {
        let mut source: LiveCapture = capture(vec![Ok(syn_frame())], 1600);

        let packet: Packet = source.next_packet().unwrap().unwrap();
        assert_eq!(packet.tcp().map(|t| t.destination_port), Some(23));
        assert_eq!(packet.metadata().capture_length, syn_frame().len());
    }

    #[test]
    fn next_packet_should_truncate_to_snaplen() {
        let mut source: LiveCapture = capture(vec![Ok(syn_frame())], 20);

        let packet: Packet = source.next_packet().unwrap().unwrap();
        assert_eq!(packet.metadata().capture_length, 20);
        assert_eq!(packet.metadata().length, syn_frame().len());
        assert!(packet.ipv4().is_none());
    }

    #[test]
    fn next_packet_should_map_errors() {
        let mut source: LiveCapture = capture(
            vec![Err(io::Error::new(io::ErrorKind::Other, "device went away"))],
            1600,
        );

        assert!(matches!(source.next_packet(), Err(CaptureError::Read(_))));
        assert!(matches!(source.next_packet(), Err(CaptureError::Timeout)));
    }
}

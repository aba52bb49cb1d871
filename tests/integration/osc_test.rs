use osc_watch::osc::{OscArg, OscMessage, OscSender, UdpOscClient};
use std::net::UdpSocket;

#[test]
fn test_float_is_big_endian() {
    let bytes = OscMessage::new("/f", vec![OscArg::Float(1.0)]).encode();
    assert_eq!(bytes, b"/f\0\0,f\0\0\x3f\x80\0\0".to_vec());
}

#[test]
fn test_decode_mixed_arguments() {
    let msg = OscMessage::new(
        "/avatar/parameters/HourTenPlace",
        vec![OscArg::Int(-3), OscArg::Float(0.5), OscArg::Str("abcd".to_string())],
    );
    assert_eq!(OscMessage::decode(&msg.encode()).unwrap(), msg);
}

#[test]
fn test_chatbox_message_layout() {
    let msg = OscMessage::new(
        "/chatbox/input",
        vec![
            OscArg::Str("hi".to_string()),
            OscArg::Bool(true),
            OscArg::Bool(false),
        ],
    );
    let bytes = msg.encode();

    assert_eq!(&bytes[..16], b"/chatbox/input\0\0");
    assert_eq!(&bytes[16..24], b",sTF\0\0\0\0");
    assert_eq!(&bytes[24..28], b"hi\0\0");
    assert_eq!(bytes.len(), 28);
    assert_eq!(bytes.len() % 4, 0);
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(OscMessage::decode(b"no-slash\0\0\0\0").is_err());
    assert!(OscMessage::decode(&[]).is_err());
}

#[test]
fn test_client_delivers_chat_to_receiver() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = receiver.local_addr().unwrap().port();

    let mut client = UdpOscClient::connect("127.0.0.1", port).unwrap();
    let args = [
        OscArg::Str("hello world".to_string()),
        OscArg::Bool(true),
        OscArg::Bool(false),
    ];
    client.send("/chatbox/input", &args).unwrap();

    let mut buf = [0u8; 512];
    let (len, _) = receiver.recv_from(&mut buf).unwrap();
    let msg = OscMessage::decode(&buf[..len]).unwrap();
    assert_eq!(msg.address, "/chatbox/input");
    assert_eq!(msg.args, args.to_vec());
}

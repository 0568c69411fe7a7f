use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::thread;
use std::time::Duration;

use lockstep65_validation::protocol::Command;
use lockstep65_validation::{
    Connection, DebugClient, DebugServer, EmulatorAdapter, ProtocolError, ReferenceAdapter,
    Register, ServeEnd,
};
mod common;
use common::remote_device;

fn served_client() -> (
    DebugClient<UnixStream, UnixStream>,
    thread::JoinHandle<Result<ServeEnd, ProtocolError>>,
) {
    let (client, server) = UnixStream::pair().unwrap();
    let server_out = server.try_clone().unwrap();
    let handle = thread::spawn(move || {
        DebugServer::new(ReferenceAdapter::new()).serve(server, server_out)
    });
    let client_in = client.try_clone().unwrap();
    (DebugClient::new(client, client_in), handle)
}

#[test]
fn test_register_and_memory_round_trip() {
    let (mut client, handle) = served_client();
    client.set_register(Register::A, 0x42).unwrap();
    client.set_register(Register::Pc, 0x2000).unwrap();
    client.write_memory(0x2000, &[0xAA, 0x95, 0x10]).unwrap(); // TAX; STA $10,X
    client.step().unwrap();
    client.step().unwrap();

    let regs = client.get_registers().unwrap();
    assert_eq!(regs.a, 0x42);
    assert_eq!(regs.x, 0x42);
    assert_eq!(regs.pc, 0x2003);
    assert_eq!(client.read_memory(0x0052, 1).unwrap(), vec![0x42]);

    client.stop().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), ServeEnd::Stopped);
}

#[test]
fn test_version_and_nop() {
    let (mut client, _handle) = served_client();
    client.nop().unwrap();
    assert!(client.version().unwrap().starts_with("lockstep65 "));
}

#[test]
fn test_server_rejects_bad_requests() {
    let (mut client, _handle) = served_client();
    assert!(matches!(
        client.transact(Command::SetRegister, 9, 0, &[]),
        Err(ProtocolError::DeviceRejected { .. })
    ));
    assert!(matches!(
        client.read_memory(0xFFFF, 2),
        Err(ProtocolError::DeviceRejected {
            command: Command::ReadMemory
        })
    ));
    assert!(matches!(
        client.load(0x0000, "/nonexistent/lockstep65.bin"),
        Err(ProtocolError::DeviceRejected { .. })
    ));
    // Undocumented opcode: the reference refuses to step
    client.write_memory(0x0400, &[0x02]).unwrap();
    client.set_register(Register::Pc, 0x0400).unwrap();
    assert!(matches!(
        client.step(),
        Err(ProtocolError::DeviceRejected {
            command: Command::Step
        })
    ));
    // Framing survives every rejection
    client.nop().unwrap();
}

#[test]
fn test_load_reads_a_file_into_memory() {
    let path = std::env::temp_dir().join(format!("lockstep65-load-{}.bin", std::process::id()));
    std::fs::write(&path, [0xA9, 0x07]).unwrap();

    let (mut client, _handle) = served_client();
    client.load(0x0800, path.to_str().unwrap()).unwrap();
    assert_eq!(client.read_memory(0x0800, 2).unwrap(), vec![0xA9, 0x07]);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_unknown_command_gets_error_status() {
    let (mut client, server) = UnixStream::pair().unwrap();
    let server_out = server.try_clone().unwrap();
    thread::spawn(move || DebugServer::new(ReferenceAdapter::new()).serve(server, server_out));

    client.write_all(&[0x42, 0, 0, 0, 0, 0, 0]).unwrap();
    let mut response = [0u8; 3];
    client.read_exact(&mut response).unwrap();
    assert_eq!(response, [0x01, 0x00, 0x00]);
}

#[test]
fn test_short_response_is_channel_closed() {
    let (client, mut server) = UnixStream::pair().unwrap();
    thread::spawn(move || {
        let mut header = [0u8; 7];
        server.read_exact(&mut header).unwrap();
        // Half a response header, then hang up
        server.write_all(&[0x00, 0x08]).unwrap();
    });
    let client_in = client.try_clone().unwrap();
    let mut client = DebugClient::new(client, client_in);
    assert!(matches!(
        client.get_registers(),
        Err(ProtocolError::ChannelClosed)
    ));
}

#[test]
fn test_silent_device_times_out() {
    let (client, _server) = UnixStream::pair().unwrap();
    let client_in = client.try_clone().unwrap();
    let connection = Connection::from_streams(client, client_in, Some(Duration::from_millis(50)));
    let mut client = DebugClient::new(connection.commands, connection.responses);
    assert!(matches!(client.nop(), Err(ProtocolError::ChannelTimeout)));
}

#[test]
fn test_device_adapter_caches_registers() {
    let mut device = remote_device();
    device.set_x(0x10).unwrap();
    device.set_pc(0x2000).unwrap();
    device.write_memory(0x2000, &[0xE8]).unwrap(); // INX
    assert_eq!(device.state().x, 0x10);
    device.step().unwrap();
    let state = device.state();
    assert_eq!(state.x, 0x11);
    assert_eq!(state.pc, 0x2001);
    assert!(!device.pending_interrupt());

    let dis = device.disassemble_at(0x2000).unwrap();
    assert_eq!(dis.text, "INX");
    assert_eq!(dis.length, 1);
}

#[test]
fn test_spawned_echo_process_is_reaped() {
    // `cat` echoes each command header back; a 7-byte NOP reads as an OK response
    // followed by four bytes of padding, which the next command never reaches.
    let connection = Connection::spawn("cat", &[], Some(Duration::from_secs(5))).unwrap();
    assert!(connection.process.is_some());
    let mut client = DebugClient::new(connection.commands, connection.responses);
    client.nop().unwrap();
    drop(client);
    drop(connection.process);
}

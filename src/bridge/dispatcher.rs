//! The dispatch loop: read one command record, resolve its address through the
//! `WindowedMapper`, perform the access and, for reads, send the response record. Commands
//! are handled strictly one at a time; the loop only ends with an error.
use std::{
    convert::Infallible,
    io::{Read, Write},
};

use crate::soc::{bus::WindowedMapper, device::PhysMemory};

use super::{
    command::{COMMAND_LEN, Command, Op, Response},
    error::BridgeResult,
    transport::{read_record, write_record},
};

pub struct Dispatcher<M: PhysMemory, R: Read, W: Write> {
    mapper: WindowedMapper<M>,
    input: R,
    output: W,
    handled: u64,
}

impl<M: PhysMemory, R: Read, W: Write> Dispatcher<M, R, W> {
    pub fn new(mapper: WindowedMapper<M>, input: R, output: W) -> Self {
        Self {
            mapper,
            input,
            output,
            handled: 0,
        }
    }

    /// Process commands until something fails.
    pub fn run(&mut self) -> BridgeResult<Infallible> {
        loop {
            self.step()?;
        }
    }

    /// Read and execute a single command. Returns the response if one was sent.
    pub fn step(&mut self) -> BridgeResult<Option<Response>> {
        let record: [u8; COMMAND_LEN] = read_record(&mut self.input)?;
        let command = Command::decode(&record)?;
        let response = self.execute(command)?;
        self.handled += 1;
        Ok(response)
    }

    /// Perform `command` against mapped memory and send its response, if it has one.
    pub fn execute(&mut self, command: Command) -> BridgeResult<Option<Response>> {
        let handle = self.mapper.resolve(u64::from(command.address))?;
        match command.op {
            Op::Read => {
                let value = handle.load(command.width)?;
                tracing::trace!(
                    "read{} 0x{:08X} -> 0x{value:08X}",
                    command.width,
                    command.address
                );
                let response = Response { value };
                write_record(&mut self.output, &response.encode())?;
                Ok(Some(response))
            }
            Op::Write => {
                handle.store(command.width, command.value)?;
                tracing::trace!(
                    "write{} 0x{:08X} <- 0x{:08X}",
                    command.width,
                    command.address,
                    command.value & command.width.mask()
                );
                Ok(None)
            }
        }
    }

    /// Commands completed so far.
    pub fn commands_handled(&self) -> u64 {
        self.handled
    }

    pub fn mapper(&self) -> &WindowedMapper<M> {
        &self.mapper
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_parts(self) -> (WindowedMapper<M>, R, W) {
        (self.mapper, self.input, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{
        BridgeError, ProtocolError,
        command::RESPONSE_LEN,
        transport::tests::{ByteSink, Trickle},
    };
    use crate::soc::{
        bus::{BusError, Width, WindowSize},
        device::{DeviceError, RamMemory},
    };

    const ORIGIN: u32 = 0x1000_0000;

    fn make_dispatcher(input: &[u8]) -> Dispatcher<RamMemory, &[u8], Vec<u8>> {
        let ram = RamMemory::new("ram", ORIGIN as u64, 0x3000);
        Dispatcher::new(WindowedMapper::new(ram, WindowSize::DEFAULT), input, Vec::new())
    }

    fn stream(commands: &[Command]) -> Vec<u8> {
        commands.iter().flat_map(Command::encode).collect()
    }

    fn drain<M: PhysMemory, R: Read, W: Write>(dispatcher: &mut Dispatcher<M, R, W>) -> BridgeError {
        match dispatcher.run() {
            Ok(never) => match never {},
            Err(err) => err,
        }
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn reference_read_returns_window_contents() {
        let input = [0x00, 0x20, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00];
        let mut dispatcher = make_dispatcher(&input);
        dispatcher
            .mapper()
            .memory()
            .poke(ORIGIN as u64, &0xDEAD_BEEF_u32.to_ne_bytes())
            .expect("seed register");

        let response = dispatcher.step().expect("read command");
        assert_eq!(response, Some(Response { value: 0xDEAD_BEEF }));
        assert_eq!(dispatcher.output(), &vec![0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn write_then_read_emits_single_response() {
        let address = ORIGIN + 0x2345;
        let input = stream(&[
            Command::write(Width::W8, address, 0x0000_00FF),
            Command::read(Width::W8, address),
        ]);
        let mut dispatcher = make_dispatcher(&input);

        let err = drain(&mut dispatcher);
        assert!(
            matches!(err, BridgeError::Eof { received: 0, .. }),
            "loop should stop at end of input, got {err:?}"
        );
        assert_eq!(dispatcher.commands_handled(), 2);
        assert_eq!(
            dispatcher.output().len(),
            RESPONSE_LEN,
            "only the read produces a response"
        );
        assert_eq!(dispatcher.output().as_slice(), &0xFF_u32.to_ne_bytes());
    }

    #[test]
    fn stores_are_truncated_to_width() {
        let input = stream(&[
            Command::write(Width::W32, ORIGIN + 0x10, 0xFFFF_FFFF),
            Command::write(Width::W16, ORIGIN + 0x10, 0xABCD_1234),
            Command::read(Width::W32, ORIGIN + 0x10),
        ]);
        let mut dispatcher = make_dispatcher(&input);
        drain(&mut dispatcher);

        let expected = if cfg!(target_endian = "little") {
            0xFFFF_1234_u32
        } else {
            0x1234_FFFF_u32
        };
        assert_eq!(dispatcher.output().as_slice(), &expected.to_ne_bytes());
    }

    #[test]
    fn byte_write_isolates_neighbours() {
        let address = ORIGIN + 0x101;
        let input = stream(&[Command::write(Width::W8, address, 0x1234_5677)]);
        let mut dispatcher = make_dispatcher(&input);
        dispatcher
            .mapper()
            .memory()
            .poke(address as u64 - 1, &[0x11, 0x22, 0x33])
            .expect("seed");

        drain(&mut dispatcher);
        assert_eq!(
            dispatcher.mapper().memory().peek(address as u64 - 1, 3).expect("peek"),
            vec![0x11, 0x77, 0x33]
        );
    }

    #[test]
    fn bad_command_code_touches_nothing() {
        let mut record = Command::write(Width::W32, ORIGIN, 0xFFFF_FFFF).encode();
        record[0] = 2;
        let mut dispatcher = make_dispatcher(&record);

        let err = drain(&mut dispatcher);
        assert!(matches!(err, BridgeError::Protocol(ProtocolError::BadCommand(2))));
        assert_eq!(dispatcher.mapper().memory().map_count(), 0, "no window should be mapped");
        assert!(dispatcher.output().is_empty());
        assert_eq!(dispatcher.commands_handled(), 0);
    }

    #[test]
    fn bad_width_touches_nothing() {
        for op in [Op::Read, Op::Write] {
            let mut record = Command::write(Width::W32, ORIGIN, 0xFFFF_FFFF).encode();
            record[0] = op as u8;
            record[1] = 64;
            let mut dispatcher = make_dispatcher(&record);

            let err = drain(&mut dispatcher);
            assert!(
                matches!(err, BridgeError::Protocol(ProtocolError::BadWidth(64))),
                "{op:?} with width 64 should fail, got {err:?}"
            );
            assert_eq!(dispatcher.mapper().memory().map_count(), 0);
            assert!(dispatcher.output().is_empty());
        }
    }

    #[test]
    fn partial_record_emits_nothing() {
        let record = Command::read(Width::W32, ORIGIN).encode();
        let mut dispatcher = make_dispatcher(&record[..6]);

        let err = drain(&mut dispatcher);
        assert!(matches!(err, BridgeError::Eof { received: 6, expected: COMMAND_LEN }));
        assert!(dispatcher.output().is_empty());
        assert_eq!(dispatcher.mapper().memory().map_count(), 0);
    }

    #[test]
    fn unmapped_address_is_a_bus_error() {
        let input = stream(&[Command::read(Width::W32, 0x2000_0000)]);
        let mut dispatcher = make_dispatcher(&input);

        let err = drain(&mut dispatcher);
        assert!(
            matches!(err, BridgeError::Bus(BusError::Device(DeviceError::OutOfRange { .. }))),
            "unexpected error {err:?}"
        );
        assert!(dispatcher.output().is_empty());
    }

    #[test]
    fn unaligned_write_then_read_round_trips() {
        let address = ORIGIN + 0x101;
        let input = stream(&[
            Command::write(Width::W16, address, 0xBEEF),
            Command::read(Width::W16, address),
        ]);
        let mut dispatcher = make_dispatcher(&input);
        let err = drain(&mut dispatcher);
        assert!(matches!(err, BridgeError::Eof { received: 0, .. }), "got {err:?}");
        assert_eq!(dispatcher.commands_handled(), 2);
        assert_eq!(dispatcher.output().as_slice(), &0xBEEF_u32.to_ne_bytes());
    }

    #[test]
    fn read_crossing_window_end_is_a_bus_error() {
        let input = stream(&[Command::read(Width::W32, ORIGIN + 0xFFE)]);
        let mut dispatcher = make_dispatcher(&input);
        let err = drain(&mut dispatcher);
        assert!(matches!(err, BridgeError::Bus(BusError::OutOfWindow { .. })), "got {err:?}");
        assert!(dispatcher.output().is_empty());
    }

    #[test]
    fn window_is_reused_across_commands() {
        let input = stream(&[
            Command::read(Width::W32, ORIGIN),
            Command::write(Width::W32, ORIGIN + 0x10, 1),
            Command::read(Width::W32, ORIGIN + 0x1000),
            Command::read(Width::W32, ORIGIN + 0x1004),
        ]);
        let mut dispatcher = make_dispatcher(&input);
        drain(&mut dispatcher);

        let ram = dispatcher.mapper().memory();
        assert_eq!(ram.map_count(), 2, "two windows touched, each mapped once");
        assert_eq!(ram.unmap_count(), 1);
        assert_eq!(dispatcher.output().len(), 3 * RESPONSE_LEN);
    }

    #[test]
    fn trickled_streams_are_reassembled() {
        let address = ORIGIN + 0x40;
        let input = stream(&[
            Command::write(Width::W32, address, 0x0BAD_F00D),
            Command::read(Width::W32, address),
        ]);
        let ram = RamMemory::new("ram", ORIGIN as u64, 0x1000);
        let mut dispatcher = Dispatcher::new(
            WindowedMapper::new(ram, WindowSize::DEFAULT),
            Trickle::new(&input, 3),
            ByteSink::default(),
        );

        drain(&mut dispatcher);
        let (mapper, _, sink) = dispatcher.into_parts();
        assert_eq!(sink.bytes, 0x0BAD_F00D_u32.to_ne_bytes().to_vec());
        assert_eq!(sink.flushes, 1);
        let ram = mapper.release().expect("release");
        assert_eq!(ram.active_window(), None);
    }
}

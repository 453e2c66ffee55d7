#![warn(missing_docs)]
/*! This crate implements a networked Wireworld cellular automaton: a
headless simulator server that computes generations of a 2D cell grid,
and a client-side frame pipeline that decodes them over a compact,
length-implicit wire protocol.

Wireworld has four cell states — insulator, wire, electron head,
electron tail — and a deterministic rule over the 8-neighbor Moore
neighborhood. See [`cell`] for the states and [`grid`] for the rule and
the double-buffered grid engine that steps it.

# Architecture overview

```text
   [ image::load_grid ]          (client, once, at startup)
            |
            v
   [ R_INIT over TCP ]  ----->  [ server session: Grid + DoubleBuffer ]
            |                              |
   [ R_FRAME / R_STOP ] <---- [ A_RECT_UPDATE / A_FRAME_END ]
            |
            v
   [ FrameBuffer: credit + pacing ]
            |
            v
   [ FrameSink: Png / Null / ... ]
```

The server ([`server`]) holds exactly one active session at a time; the
client pairs a decoder (driving [`proto::server::Message::read`]) with
a [`frame_buffer::FrameBuffer`] that applies flow control and delivery
pacing before handing completed frames to a [`adapters::display::FrameSink`].

# Examples

```
use wireworld::cell::Cell;
use wireworld::grid::{DoubleBuffer, Grid};

let mut dbuf = DoubleBuffer::from_initial(Grid::from_row_major(
    3,
    1,
    &[Cell::Wire, Cell::Head, Cell::Wire],
));
dbuf.step();
assert_eq!(
    dbuf.current().iter_row_major().collect::<Vec<_>>(),
    vec![Cell::Head, Cell::Tail, Cell::Head]
);
```
*/

pub mod adapters;
pub mod cell;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame_buffer;
pub mod grid;
pub mod proto;
pub mod server;

pub use cell::Cell;
pub use error::{Error, ProtocolError};

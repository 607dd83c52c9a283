/*!
 Contains logic and data structures used to parse and query Apple's compiled
 Interface Builder `NIBArchive` format.

 ## Overview

 A NIB archive stores a serialized user interface object graph as four
 parallel tables: objects, keys, values, and class names. The fixed-size
 header declares an entry count and a byte offset for each table. Objects
 address a contiguous window of the shared value table, values reference
 keys by index, and a data value's payload may itself be a complete nested
 archive, which is decoded recursively.

 ## Features

 - Pure Rust implementation with no Apple framework dependencies
 - Optional verification of the header's declared table offsets against the
   number of bytes each table actually consumed
 - Robust error handling for malformed or incomplete archive data
*/

pub mod models;
pub mod parser;
mod tests;

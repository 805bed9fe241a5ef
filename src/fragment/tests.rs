//! Unit tests for the fragmentation and reassembly subsystem.

mod reassembler_tests;

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
#![allow(static_mut_refs)]
#![cfg_attr(target_arch = "m68k", feature(asm_experimental_arch))]

#[cfg(not(test))]
mod amiga;
mod asm;
#[cfg(not(test))]
mod boot;
#[cfg_attr(test, allow(dead_code))]
mod os;

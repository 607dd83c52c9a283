/*!
 This module contains types of errors that can happen when parsing NIB archive data.
*/

pub mod archive;

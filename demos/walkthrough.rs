//! A tour of the handle.
//!
//! This example demonstrates:
//! 1. Storing a value and reading it back in every access shape
//! 2. Reassigning a handle to values of unrelated types
//! 3. Copying a handle that owns a custom type
//! 4. Storing a C string by pointer without taking ownership
//! 5. What happens when the wrong type is requested

use std::ffi::{CStr, c_char};

use anonptr::prelude::*;

#[derive(Clone, Debug)]
struct Point {
    x: i32,
    y: i32,
}

/// Values go in by move and come back out only under their exact type.
fn float_round_trip() -> Result<(), InvalidCast> {
    println!("1. Storing a float");

    let mut handle: AnonPtr = AnonPtr::new(3.7f32);
    println!("   stored {} of type `{}`", handle.cloned::<f32>()?, handle.type_identity());

    *handle.get_mut::<&mut f32>()? += 1.0;
    println!("   after increment: {}", handle.get::<&f32>()?);

    let ptr = handle.get::<*const f32>()?;
    println!("   address of the payload: {ptr:p}");
    println!();
    Ok(())
}

/// A handle is not tied to one type: assigning a new handle drops the old
/// payload.
fn reassignment() -> Result<(), InvalidCast> {
    println!("2. Reassigning");

    let mut handle: AnonPtr = AnonPtr::new(42i64);
    println!("   holds an i64: {}", handle.get::<&i64>()?);

    handle = AnonPtr::new(String::from("now a string"));
    println!("   holds a String: {}", handle.get::<&String>()?);

    handle = vec![1u8, 2, 3].into_anon();
    println!("   holds a Vec<u8>: {:?}", handle.get::<&Vec<u8>>()?);
    println!(
        "   is one of (i64, String, Vec<u8>): {}",
        handle.is_any::<(i64, String, Vec<u8>)>()
    );
    println!();
    Ok(())
}

/// Cloning a handle clones the payload, so the copies evolve separately.
fn copy_custom_type() -> Result<(), InvalidCast> {
    println!("3. Copying a custom type");

    let original: AnonPtr = AnonPtr::new(Point { x: 1, y: 2 });
    let mut copy = original.clone();
    copy.get_mut::<&mut Point>()?.x = 10;

    println!("   original: {:?}", original.get::<&Point>()?);
    println!("   copy:     {:?}", copy.get::<&Point>()?);
    let sum = {
        let point = copy.get::<&Point>()?;
        point.x + point.y
    };
    println!("   copy coordinates sum to {sum}");
    println!();
    Ok(())
}

/// Raw pointers are stored as is and the pointee is never freed.
fn c_string_by_pointer() -> Result<(), InvalidCast> {
    println!("4. Storing a C string by pointer");

    let message = c"hello from C";
    let mut handle: AnonPtr = AnonPtr::new(message.as_ptr());
    let copy = handle.clone();
    println!(
        "   owns payload: {}, stored type: `{}`",
        handle.owns_payload(),
        handle.type_identity()
    );

    let ptr = copy.pointer::<*const c_char>()?;
    // SAFETY: `message` is a nul-terminated string that outlives both handles
    let text = unsafe { CStr::from_ptr(ptr) };
    println!("   read through the copy: {}", text.to_string_lossy());

    if let Err(error) = handle.get_mut::<&mut *const c_char>() {
        println!("   rebinding refused: {error}");
    }
    println!();
    Ok(())
}

/// Only the exact stored type matches; everything else is an error.
fn failed_casts() {
    println!("5. Asking for the wrong type");

    let handle: AnonPtr = AnonPtr::new(3.7f32);
    if let Err(error) = handle.get::<&i32>() {
        eprintln!("   {error}");
    }
    if let Err(error) = handle.cloned::<f64>() {
        eprintln!("   {error}");
    }

    let pointer: AnonPtr = AnonPtr::from_ptr(c"text".as_ptr());
    if let Err(error) = pointer.pointer::<*mut c_char>() {
        eprintln!("   {error}");
    }

    match handle.take::<String>() {
        Ok(text) => println!("   unexpectedly took {text}"),
        Err(error) => {
            eprintln!("   {error}");
            let handle = error.into_inner();
            println!("   the handle still holds {:?}", handle.cloned::<f32>());
        }
    }
}

fn main() -> Result<(), InvalidCast> {
    float_round_trip()?;
    reassignment()?;
    copy_custom_type()?;
    c_string_by_pointer()?;
    failed_casts();
    Ok(())
}

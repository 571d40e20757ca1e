use std::{
    cell::Cell,
    ffi::{CStr, c_char},
    rc::Rc,
    sync::Arc,
    thread,
};

use anonptr::{AnonPtr, INLINE_CAPACITY, IntoAnonPtr, markers::SendSync};

#[derive(Clone)]
struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Shape {
    name: &'static str,
    sides: u32,
}

#[derive(Clone, Debug, PartialEq)]
struct Square {
    shape: Shape,
    length: f64,
}

#[test]
fn float_round_trip_and_reassignment() {
    let drops = Rc::new(Cell::new(0));
    let mut handle: AnonPtr = AnonPtr::new(3.7f32);

    assert_eq!(handle.cloned::<f32>(), Ok(3.7));
    assert_eq!(*handle.get::<&f32>().unwrap(), 3.7);
    *handle.get_mut::<&mut f32>().unwrap() *= 2.0;
    assert_eq!(handle.cloned::<f32>(), Ok(7.4));

    let error = handle.get::<&i32>().unwrap_err();
    assert_eq!(
        error.to_string(),
        "invalid cast to `i32`: underlying object is `f32`"
    );
    assert_eq!(handle.cloned::<f32>(), Ok(7.4));

    handle = AnonPtr::new(DropCounter(Rc::clone(&drops)));
    assert!(handle.is::<DropCounter>());
    assert_eq!(drops.get(), 0);

    handle = AnonPtr::new(String::from("hello"));
    assert_eq!(drops.get(), 1);
    assert_eq!(handle.get::<&String>().unwrap(), "hello");
    assert!(handle.is_any::<(i32, f32, String)>());

    drop(handle);
    assert_eq!(drops.get(), 1);
}

#[test]
fn copies_are_independent() {
    let original: AnonPtr = AnonPtr::new(Square {
        shape: Shape {
            name: "square",
            sides: 4,
        },
        length: 2.0,
    });

    let mut copy = original.clone();
    copy.get_mut::<&mut Square>().unwrap().length = 5.0;

    assert_eq!(original.get::<&Square>().unwrap().length, 2.0);
    assert_eq!(copy.get::<&Square>().unwrap().length, 5.0);
    assert_eq!(copy.get::<&Square>().unwrap().shape.name, "square");
    assert_eq!(copy.get::<&Square>().unwrap().shape.sides, 4);
    assert_ne!(
        original.get::<*const Square>().unwrap(),
        copy.get::<*const Square>().unwrap()
    );

    // The embedded shape is not the stored type
    assert!(original.get::<&Shape>().is_err());
}

#[test]
fn every_copy_drops_its_own_payload() {
    let drops = Rc::new(Cell::new(0));
    let original: AnonPtr = AnonPtr::new(DropCounter(Rc::clone(&drops)));
    let copies: Vec<AnonPtr> = (0..3).map(|_| original.clone()).collect();

    drop(original);
    assert_eq!(drops.get(), 1);
    drop(copies);
    assert_eq!(drops.get(), 4);
}

#[test]
fn moving_a_handle_moves_ownership() {
    let drops = Rc::new(Cell::new(0));
    let handle: AnonPtr = AnonPtr::new(DropCounter(Rc::clone(&drops)));

    let moved = handle;
    let boxed = Box::new(moved);
    assert_eq!(drops.get(), 0);

    drop(boxed);
    assert_eq!(drops.get(), 1);
}

#[test]
fn stored_pointers_are_never_freed() {
    let drops = Rc::new(Cell::new(0));
    let mut target = DropCounter(Rc::clone(&drops));

    let handle: AnonPtr = AnonPtr::from_ptr(&raw mut target);
    let copies: Vec<AnonPtr> = (0..3).map(|_| handle.clone()).collect();
    assert!(copies.iter().all(|copy| !copy.owns_payload()));
    assert!(copies.iter().all(|copy| {
        copy.pointer::<*mut DropCounter>()
            .is_ok_and(|ptr| std::ptr::eq(ptr, &raw const target))
    }));

    drop(handle);
    drop(copies);
    assert_eq!(drops.get(), 0);

    drop(target);
    assert_eq!(drops.get(), 1);
}

#[test]
fn c_string_through_pointer() {
    let message = c"from a pointer";
    let handle: AnonPtr = AnonPtr::from_ptr(message.as_ptr());

    assert!(handle.is::<*const c_char>());
    let ptr = handle.pointer::<*const c_char>().unwrap();
    // SAFETY: `message` outlives the handle and is nul-terminated
    let read_back = unsafe { CStr::from_ptr(ptr) };
    assert_eq!(read_back, message);

    assert!(handle.pointer::<*mut c_char>().is_err());
    assert!(handle.get::<&c_char>().is_err());
}

#[test]
fn pointers_keep_their_policy_through_every_constructor() {
    let drops = Rc::new(Cell::new(0));
    let mut target = DropCounter(Rc::clone(&drops));
    let ptr: *mut DropCounter = &raw mut target;

    let handles: [AnonPtr; 4] = [
        AnonPtr::new(ptr),
        AnonPtr::make::<*mut DropCounter, _>(ptr),
        ptr.into_anon(),
        AnonPtr::from_ptr(ptr),
    ];
    for handle in &handles {
        assert!(!handle.owns_payload());
        assert!(handle.is::<*mut DropCounter>());
        assert_eq!(handle.type_name(), "*mut lifecycle::DropCounter");
        assert_eq!(handle.cloned::<*mut DropCounter>(), Ok(ptr));
    }

    let mut handles = handles;
    for handle in &mut handles {
        let error = handle.get_mut::<&mut *mut DropCounter>().unwrap_err();
        assert!(error.is_pointer_rebind());
        assert!(error.stored().is::<*mut DropCounter>());
    }

    drop(handles);
    assert_eq!(drops.get(), 0);
    drop(target);
    assert_eq!(drops.get(), 1);
}

#[test]
fn take_moves_payload_out() {
    let drops = Rc::new(Cell::new(0));
    let handle: AnonPtr = AnonPtr::new(DropCounter(Rc::clone(&drops)));

    let handle = match handle.take::<String>() {
        Ok(_) => panic!("the handle does not hold a string"),
        Err(error) => {
            assert!(error.requested().is::<String>());
            error.into_inner()
        }
    };
    assert_eq!(drops.get(), 0);

    let Ok(value) = handle.take::<DropCounter>() else {
        panic!("the handle holds a drop counter")
    };
    assert_eq!(drops.get(), 0);
    drop(value);
    assert_eq!(drops.get(), 1);
}

#[test]
fn handles_nest_only_across_markers() {
    let inner: AnonPtr = 5u16.into_anon();
    let outer: AnonPtr = AnonPtr::new(inner.clone());
    assert!(outer.is::<u16>());

    let holder: AnonPtr<SendSync> = AnonPtr::new(vec![1u8]);
    let wrapper: AnonPtr = AnonPtr::new(holder);
    let unwrapped = wrapper.get::<&AnonPtr<SendSync>>().unwrap();
    assert_eq!(unwrapped.get::<&Vec<u8>>().unwrap(), &[1]);
}

#[test]
fn send_sync_handles_cross_threads() {
    let handle: AnonPtr<SendSync> = AnonPtr::new(Arc::new(String::from("shared")));
    let shared = Arc::new(handle);

    let lengths: Vec<usize> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || shared.get::<&Arc<String>>().unwrap().len())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|join| join.join().unwrap())
        .collect();
    assert_eq!(lengths, [6; 4]);

    let moved = thread::spawn(|| AnonPtr::<SendSync>::new(7u64))
        .join()
        .unwrap();
    assert_eq!(moved.cloned::<u64>(), Ok(7));
}

#[test]
fn handle_size_is_fixed() {
    assert_eq!(size_of::<AnonPtr>(), INLINE_CAPACITY);
    assert_eq!(size_of::<AnonPtr<SendSync>>(), INLINE_CAPACITY);
    assert!(INLINE_CAPACITY >= size_of::<*const [u8]>() + size_of::<usize>());
}

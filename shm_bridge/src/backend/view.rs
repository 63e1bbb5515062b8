use std::{io, iter, mem, ptr, slice};

use windows_sys::Win32::{
    Foundation::CloseHandle,
    System::Memory::{
        FILE_MAP_READ, FILE_MAP_WRITE, MEMORY_BASIC_INFORMATION, MEMORY_MAPPED_VIEW_ADDRESS,
        MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, VirtualQuery,
    },
};

use crate::{
    layout::REGION_SIZE,
    region::{Region, check_write, copy_out},
};

/// A view of a named Windows file mapping.
pub struct ViewRegion {
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    len: usize,
    writable: bool,
    origin: String,
}

impl ViewRegion {
    /// Opens the file mapping object called `name` and maps a view of it,
    /// read-write when permitted and read-only otherwise.
    ///
    /// # Errors
    /// Returns `NotFound` when no mapping has that name.
    pub fn open(name: &str) -> io::Result<Self> {
        let wide: Vec<u16> = name.encode_utf16().chain(iter::once(0)).collect();

        let (access, handle) = {
            let rw = FILE_MAP_READ | FILE_MAP_WRITE;
            // SAFETY: `wide` is NUL terminated and outlives the call.
            let handle = unsafe { OpenFileMappingW(rw, 0, wide.as_ptr()) };
            if !handle.is_null() {
                (rw, handle)
            } else {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::PermissionDenied {
                    return Err(err);
                }
                // SAFETY: as above.
                let handle = unsafe { OpenFileMappingW(FILE_MAP_READ, 0, wide.as_ptr()) };
                if handle.is_null() {
                    return Err(io::Error::last_os_error());
                }
                (FILE_MAP_READ, handle)
            }
        };

        // SAFETY: `handle` is a live mapping handle. The view holds its own
        //         reference to the section, so the handle is closed right away.
        let view = unsafe { MapViewOfFile(handle, access, 0, 0, 0) };
        let mapped = if view.Value.is_null() {
            Err(io::Error::last_os_error())
        } else {
            Ok(view)
        };
        unsafe { CloseHandle(handle) };
        let view = mapped?;

        // SAFETY: `view.Value` is the base of a view mapped above and `info`
        //         is a properly sized out parameter.
        let mut info: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };
        let queried = unsafe {
            VirtualQuery(view.Value, &mut info, mem::size_of::<MEMORY_BASIC_INFORMATION>())
        };
        if queried == 0 {
            let err = io::Error::last_os_error();
            unsafe { UnmapViewOfFile(view) };
            return Err(err);
        }

        Ok(Self {
            view,
            len: info.RegionSize.min(REGION_SIZE),
            writable: access & FILE_MAP_WRITE != 0,
            origin: format!("mapping:{name}"),
        })
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: The view stays mapped until drop and spans at least `len`
        //         bytes. The writer mutates it concurrently, so bytes are only
        //         copied out and a torn update yields wrong bytes rather than
        //         an invalid Rust value.
        unsafe { slice::from_raw_parts(self.view.Value as *const u8, self.len) }
    }
}

impl Region for ViewRegion {
    fn len(&self) -> usize {
        self.len
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> io::Result<usize> {
        Ok(copy_out(self.bytes(), offset, buf))
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> io::Result<()> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is mapped read-only", self.origin),
            ));
        }

        check_write(self.len, offset, data.len())?;
        // SAFETY: `check_write` keeps the range inside the writable view.
        unsafe {
            ptr::copy_nonoverlapping(
                data.as_ptr(),
                (self.view.Value as *mut u8).add(offset),
                data.len(),
            );
        }
        Ok(())
    }

    /// A section lives while any view of it is open, this one included, so
    /// a writer exiting is not observable here.
    fn probe(&self) -> io::Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

impl Drop for ViewRegion {
    fn drop(&mut self) {
        // SAFETY: `view` was returned by `MapViewOfFile` and is unmapped once.
        unsafe { UnmapViewOfFile(self.view) };
    }
}

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use plan_csv::Exclusions;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(err: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(err).ok();
    });
}

/// Read an optional `;`-separated exclusion list. A null pointer means no
/// exclusions.
unsafe fn exclusions(exclude: *const c_char) -> Result<Exclusions, String> {
    if exclude.is_null() {
        return Ok(Exclusions::new());
    }
    match CStr::from_ptr(exclude).to_str() {
        Ok(s) => Ok(Exclusions::parse(s)),
        Err(e) => Err(format!("Invalid UTF-8 in exclusion list: {}", e)),
    }
}

fn into_c_string(csv: Result<String, plan_csv::PlanError>) -> *mut c_char {
    let csv = match csv {
        Ok(csv) => csv,
        Err(e) => {
            set_last_error(format!("Failed to convert plan: {}", e));
            return ptr::null_mut();
        }
    };

    match CString::new(csv) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            set_last_error(format!("Failed to convert CSV to C string: {}", e));
            ptr::null_mut()
        }
    }
}

/// Convert the schedule PDF at `path` to calendar CSV. Returns null on error;
/// the message is available from `plan_csv_last_error`. Free the result with
/// `plan_csv_string_free`.
#[no_mangle]
pub extern "C" fn plan_csv_from_path(path: *const c_char, exclude: *const c_char) -> *mut c_char {
    if path.is_null() {
        set_last_error("Path pointer is null".to_string());
        return ptr::null_mut();
    }

    let path_str = unsafe {
        match CStr::from_ptr(path).to_str() {
            Ok(s) => s,
            Err(e) => {
                set_last_error(format!("Invalid UTF-8 in path: {}", e));
                return ptr::null_mut();
            }
        }
    };

    let excluded = match unsafe { exclusions(exclude) } {
        Ok(excluded) => excluded,
        Err(e) => {
            set_last_error(e);
            return ptr::null_mut();
        }
    };

    into_c_string(plan_csv::plan_from_path(path_str, &excluded))
}

/// Convert a schedule PDF held in memory to calendar CSV.
#[no_mangle]
pub extern "C" fn plan_csv_from_bytes(
    data: *const u8,
    len: usize,
    exclude: *const c_char,
) -> *mut c_char {
    if data.is_null() {
        set_last_error("Data pointer is null".to_string());
        return ptr::null_mut();
    }

    let bytes = unsafe { std::slice::from_raw_parts(data, len) };

    let excluded = match unsafe { exclusions(exclude) } {
        Ok(excluded) => excluded,
        Err(e) => {
            set_last_error(e);
            return ptr::null_mut();
        }
    };

    into_c_string(plan_csv::plan_from_bytes(bytes, &excluded))
}

#[no_mangle]
pub extern "C" fn plan_csv_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

/// The last error on this thread, or null. Valid until the next failing call.
#[no_mangle]
pub extern "C" fn plan_csv_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(err) => err.as_ptr(),
        None => ptr::null(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let err = plan_csv_last_error();
        assert!(!err.is_null());
        unsafe { CStr::from_ptr(err) }.to_str().unwrap().to_string()
    }

    #[test]
    fn null_path_sets_error() {
        let csv = plan_csv_from_path(ptr::null(), ptr::null());
        assert!(csv.is_null());
        assert_eq!(last_error(), "Path pointer is null");
    }

    #[test]
    fn null_data_sets_error() {
        let csv = plan_csv_from_bytes(ptr::null(), 0, ptr::null());
        assert!(csv.is_null());
        assert_eq!(last_error(), "Data pointer is null");
    }

    #[test]
    fn garbage_bytes_report_pdf_error() {
        let data = b"not a pdf";
        let exclude = CString::new("Matematyka").unwrap();
        let csv = plan_csv_from_bytes(data.as_ptr(), data.len(), exclude.as_ptr());
        assert!(csv.is_null());
        assert!(last_error().starts_with("Failed to convert plan: "));
    }

    #[test]
    fn invalid_utf8_exclusions_are_rejected() {
        let data = b"%PDF-1.5";
        let exclude = CString::new(vec![0xff, 0xfe]).unwrap();
        let csv = plan_csv_from_bytes(data.as_ptr(), data.len(), exclude.as_ptr());
        assert!(csv.is_null());
        assert!(last_error().starts_with("Invalid UTF-8 in exclusion list"));
    }

    #[test]
    fn free_accepts_null() {
        plan_csv_string_free(ptr::null_mut());
    }
}

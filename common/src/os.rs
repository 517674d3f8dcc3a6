use std::{cell::Cell, rc::Rc};

use windows::{
    core::{s, PCSTR},
    Win32::{
        Foundation::{HINSTANCE, HMODULE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        System::LibraryLoader::GetModuleHandleA,
        UI::{
            Input::KeyboardAndMouse::VK_ESCAPE,
            WindowsAndMessaging::{
                CreateWindowExA, DefWindowProcA, DestroyWindow, DispatchMessageA, GetClientRect,
                GetSystemMetrics, GetWindowLongPtrA, IsWindow, LoadCursorA, PeekMessageA,
                PostQuitMessage, RegisterClassExA, SetForegroundWindow, SetWindowLongPtrA,
                ShowCursor, ShowWindow, TranslateMessage, UnregisterClassA, CREATESTRUCTA,
                CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, IDC_ARROW, MSG, PM_REMOVE, SM_CXSCREEN,
                SM_CYSCREEN, SW_HIDE, SW_SHOW, WM_CREATE, WM_DESTROY, WM_KEYDOWN, WM_QUIT,
                WNDCLASSEXA, WS_EX_APPWINDOW, WS_POPUP,
            },
        },
    },
};

use crate::{
    error::{Error, Result},
    run_state::{LoopControl, LoopEvent},
    util::AsCString,
};

const CLASS_NAME: PCSTR = s!("LearnD3D11Class");

type SharedControl = Rc<Cell<LoopControl>>;

/// Borderless popup window centred on the primary display.
///
/// The cursor is hidden for as long as the window exists.
pub struct Window {
    hwnd: HWND,
    instance: HMODULE,
    // Referenced by the window procedure through GWLP_USERDATA.
    control: SharedControl,
}

impl Window {
    fn new(
        title: impl Into<String>,
        window_size: (i32, i32),
        control: SharedControl,
    ) -> Result<Self> {
        let instance = unsafe { GetModuleHandleA(None) }.map_err(|e| {
            log::error!("failed to get module handle: {e}");
            Error::WindowClass
        })?;

        let wc = WNDCLASSEXA {
            cbSize: std::mem::size_of::<WNDCLASSEXA>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wndproc),
            hInstance: instance.into(),
            hCursor: unsafe { LoadCursorA(None, PCSTR(IDC_ARROW.0 as _)) }.unwrap_or_default(),
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };

        if unsafe { RegisterClassExA(&wc) } == 0 {
            return Err(Error::WindowClass);
        }

        let (width, height) = window_size;
        let x = (unsafe { GetSystemMetrics(SM_CXSCREEN) } - width) / 2;
        let y = (unsafe { GetSystemMetrics(SM_CYSCREEN) } - height) / 2;

        let title = title.into();
        log::debug!("creating {width}x{height} window '{title}' at ({x}, {y})");
        let title = title.as_c_string();

        let hwnd = unsafe {
            CreateWindowExA(
                WS_EX_APPWINDOW,
                CLASS_NAME,
                PCSTR(title.as_ptr() as _),
                WS_POPUP,
                x,
                y,
                width,
                height,
                None, // No parent window.
                None, // No menus.
                instance,
                Some(Rc::as_ptr(&control) as *const std::ffi::c_void),
            )
        };

        let hwnd = match hwnd {
            Ok(hwnd) if hwnd != HWND::default() => hwnd,
            other => {
                if let Err(e) = other {
                    log::error!("CreateWindowExA failed: {e}");
                }
                unregister_class(instance);
                return Err(Error::WindowCreation);
            }
        };

        unsafe { ShowCursor(false) };

        Ok(Self {
            hwnd,
            instance,
            control,
        })
    }

    pub fn get_handle(&self) -> HWND {
        self.hwnd
    }

    pub fn get_physical_size(&self) -> (i32, i32) {
        let mut window_rect = RECT::default();
        if let Err(e) = unsafe { GetClientRect(self.hwnd, &mut window_rect) } {
            log::warn!("failed to get client rect {e}");
        }

        (
            window_rect.right - window_rect.left,
            window_rect.bottom - window_rect.top,
        )
    }

    pub fn set_visible(&self, visible: bool) {
        let show = if visible { SW_SHOW } else { SW_HIDE };
        let _ = unsafe { ShowWindow(self.hwnd, show) };
        if visible {
            let _ = unsafe { SetForegroundWindow(self.hwnd) };
        }
    }

    pub fn is_running(&self) -> bool {
        self.control.get().is_running()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            ShowCursor(true);
            // `control` outlives this call, so WM_DESTROY still finds it.
            if IsWindow(self.hwnd).as_bool() {
                let _ = DestroyWindow(self.hwnd);
                // A pending WM_QUIT would dismiss the next modal dialog at once.
                let mut message = MSG::default();
                let _ = PeekMessageA(&mut message, None, WM_QUIT, WM_QUIT, PM_REMOVE);
            }
        }
        unregister_class(self.instance);
    }
}

fn unregister_class(instance: HMODULE) {
    if let Err(e) = unsafe { UnregisterClassA(CLASS_NAME, HINSTANCE::from(instance)) } {
        log::debug!("failed to unregister window class {e}");
    }
}

/// Non-blocking message pump driving the update/render cycle.
pub struct App {
    control: SharedControl,
}

impl App {
    pub fn init(title: impl Into<String>, window_size: (i32, i32)) -> Result<(App, Window)> {
        let control = SharedControl::default();
        let app = App {
            control: control.clone(),
        };

        let window = Window::new(title, window_size, control)?;
        window.set_visible(true);

        Ok((app, window))
    }

    /// Drains every pending message.
    ///
    /// Returns `true` when the queue is empty and the loop is still running,
    /// meaning the caller should run one update/render cycle.
    pub fn run(&mut self) -> bool {
        let mut message = MSG::default();
        while self.control.get().is_running() {
            if !unsafe { PeekMessageA(&mut message, None, 0, 0, PM_REMOVE).as_bool() } {
                break;
            }

            let param = message.wParam.0 as i32;
            if !self.on_message(param, message.message == WM_QUIT) {
                log::debug!("message loop stopped by {:?}", LoopEvent::Quit(param));
                break;
            }

            unsafe {
                let _ = TranslateMessage(&message);
                DispatchMessageA(&message);
            }
        }

        self.control.get().is_running()
    }

    pub fn exit_code(&self) -> i32 {
        self.control.get().exit_code()
    }

    fn on_message(&self, param: i32, is_quit: bool) -> bool {
        let mut state = self.control.get();
        let dispatch = state.on_message(param, is_quit);
        self.control.set(state);
        dispatch
    }
}

fn apply(control: &Cell<LoopControl>, event: LoopEvent) -> bool {
    let mut state = control.get();
    let stopped = state.handle(event);
    control.set(state);
    if stopped {
        log::debug!("message loop stopped by {event:?}");
    }
    stopped
}

fn window_wndproc(control: &Cell<LoopControl>, hwnd: HWND, message: u32, wparam: WPARAM) -> bool {
    match message {
        WM_KEYDOWN => {
            if wparam.0 == VK_ESCAPE.0 as usize && apply(control, LoopEvent::EscapePressed) {
                // Re-enters the window procedure with WM_DESTROY; no borrow is held here.
                let _ = unsafe { DestroyWindow(hwnd) };
            }
            true
        }

        WM_DESTROY => {
            apply(control, LoopEvent::Destroyed);
            unsafe { PostQuitMessage(0) };
            true
        }

        _ => false,
    }
}

extern "system" fn wndproc(hwnd: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if message == WM_CREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTA) };
        unsafe { SetWindowLongPtrA(hwnd, GWLP_USERDATA, create_struct.lpCreateParams as _) };
        return LRESULT::default();
    }

    let user_data = unsafe { GetWindowLongPtrA(hwnd, GWLP_USERDATA) };
    let control = std::ptr::NonNull::<Cell<LoopControl>>::new(user_data as _);
    let handled =
        control.is_some_and(|c| window_wndproc(unsafe { c.as_ref() }, hwnd, message, wparam));

    if handled {
        LRESULT::default()
    } else {
        unsafe { DefWindowProcA(hwnd, message, wparam, lparam) }
    }
}

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::rc::Rc;

use bytemuck::Pod;
use thiserror::Error;

use crate::core::platform::backend::{
    BufferParameter, BufferTarget, BufferUsage, GraphicsBackend, StorageFlags,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("could not create GPU buffer: {0}")]
    Creation(String),
    /// Immutable storage can be declared once and never re-specified
    #[error("buffer storage is immutable and cannot be specified again")]
    ImmutableStorage,
    #[error("immutable buffer storage needs OpenGL 4.4 or GL_ARB_buffer_storage")]
    StorageUnsupported,
    /// Immutable storage cannot have zero size
    #[error("immutable buffer storage cannot be empty")]
    EmptyImmutableStorage,
    #[error("immutable buffer storage was created with {flags:?}, which does not allow writes")]
    NotWritable { flags: StorageFlags },
    #[error("byte range {offset}..{end} is outside the {size} bytes of the buffer")]
    OutOfRange {
        offset: usize,
        end: usize,
        size: usize,
    },
    #[error("byte length {byte_len} is not a multiple of the {element_size} byte element size")]
    Misaligned { byte_len: usize, element_size: usize },
    #[error("driver reported an unknown buffer usage 0x{0:04X}")]
    UnknownUsage(u32),
}

/// What kind of storage currently backs a buffer, as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Never populated, or populated with zero mutable bytes
    Empty,
    Mutable(BufferUsage),
    Immutable(StorageFlags),
}

/// Owning handle to a block of GPU memory holding elements of type `T`.
///
/// The driver handle is created in the constructor and deleted on drop, and
/// nowhere else. Cloning is explicit ([GpuBuffer::try_clone]) because it
/// allocates a second GPU buffer.
///
/// With `auto_bind` every operation binds the buffer to its target right
/// before touching it. Without it, [GpuBuffer::bind] is a no-op and the
/// caller is responsible for the buffer being bound when it is used.
///
/// Immutable storage is only used, and only queried, when the backend
/// supports it. On older contexts every buffer is mutable.
pub struct GpuBuffer<T: Pod, B: GraphicsBackend> {
    gl: Rc<B>,
    id: B::Buffer,
    target: BufferTarget,
    auto_bind: bool,
    buffer_storage: bool,
    _element: PhantomData<T>,
}

impl<T: Pod, B: GraphicsBackend> GpuBuffer<T, B> {
    const ELEMENT_SIZE: usize = size_of::<T>();

    /// Auto-binding buffer for vertex attribute data
    pub fn new(gl: Rc<B>) -> Result<Self, BufferError> {
        Self::with_config(gl, true, BufferTarget::default())
    }

    pub fn with_config(gl: Rc<B>, auto_bind: bool, target: BufferTarget) -> Result<Self, BufferError> {
        let id = gl.create_buffer().map_err(BufferError::Creation)?;
        log::trace!("Created GPU buffer {:?} for {:?}", id, target);

        Ok(GpuBuffer {
            buffer_storage: gl.supports_buffer_storage(),
            gl,
            id,
            target,
            auto_bind,
            _element: PhantomData,
        })
    }

    /// Auto-binding buffer populated with mutable storage right away
    pub fn with_mutable_data(gl: Rc<B>, data: &[T], usage: BufferUsage) -> Result<Self, BufferError> {
        let mut buffer = Self::new(gl)?;
        buffer.set_mutable_data(data, usage)?;
        Ok(buffer)
    }

    /// Allocate a new buffer with the same configuration and a copy of the
    /// current GPU-side contents. Immutable storage is replicated with the
    /// same flags, mutable storage with the same usage hint.
    pub fn try_clone(&self) -> Result<Self, BufferError> {
        let copy = Self::with_config(self.gl.clone(), self.auto_bind, self.target)?;

        // Both storage queries and the download run against this one binding
        self.bind_now(self.target);
        if self.bound_is_immutable() {
            let flags = StorageFlags::from_bits_retain(
                self.parameter(BufferParameter::StorageFlags) as u32,
            );
            let bytes = self.download_bound();

            copy.bind_now(copy.target);
            copy.gl.buffer_storage(copy.target, &bytes, flags);
        } else {
            let usage = self.parameter(BufferParameter::Usage) as u32;
            let usage = BufferUsage::from_gl(usage).ok_or(BufferError::UnknownUsage(usage))?;
            let bytes = self.download_bound();

            copy.bind_now(copy.target);
            copy.gl.buffer_data(copy.target, &bytes, usage);
        }
        log::trace!("Cloned GPU buffer {:?} into {:?}", self.id, copy.id);

        Ok(copy)
    }

    #[inline(always)]
    pub fn id(&self) -> B::Buffer {
        self.id
    }

    #[inline(always)]
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Change the binding point used from now on. The data stays where it is.
    #[inline(always)]
    pub fn set_target(&mut self, target: BufferTarget) {
        self.target = target;
    }

    #[inline(always)]
    pub fn auto_bind(&self) -> bool {
        self.auto_bind
    }

    #[inline(always)]
    pub fn backend(&self) -> &Rc<B> {
        &self.gl
    }

    /// Bind to the stored target, if auto binding is on
    pub fn bind(&self) {
        self.bind_to(self.target);
    }

    /// Bind to `target`, if auto binding is on
    pub fn bind_to(&self, target: BufferTarget) {
        if self.auto_bind {
            self.bind_now(target);
        }
    }

    /// Allocated size in bytes, queried from the driver
    pub fn size(&self) -> usize {
        self.bind();
        self.parameter(BufferParameter::Size).max(0) as usize
    }

    /// Number of whole `T` elements in the buffer
    pub fn len(&self) -> usize {
        self.size().checked_div(Self::ELEMENT_SIZE).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn storage_kind(&self) -> Result<StorageKind, BufferError> {
        self.bind();
        if self.bound_is_immutable() {
            let flags = self.parameter(BufferParameter::StorageFlags) as u32;
            return Ok(StorageKind::Immutable(StorageFlags::from_bits_retain(flags)));
        }
        if self.parameter(BufferParameter::Size) <= 0 {
            return Ok(StorageKind::Empty);
        }
        let usage = self.parameter(BufferParameter::Usage) as u32;
        BufferUsage::from_gl(usage)
            .map(StorageKind::Mutable)
            .ok_or(BufferError::UnknownUsage(usage))
    }

    /// Replace the whole contents, (re)allocating mutable storage
    pub fn set_mutable_data(&mut self, data: &[T], usage: BufferUsage) -> Result<(), BufferError> {
        self.bind();
        if self.bound_is_immutable() {
            return Err(BufferError::ImmutableStorage);
        }

        self.gl.buffer_data(self.target, bytemuck::cast_slice(data), usage);
        log::trace!(
            "Uploaded {} elements to GPU buffer {:?} ({:?})",
            data.len(),
            self.id,
            usage
        );
        Ok(())
    }

    /// Declare fixed-size storage. Only allowed once per buffer; later writes
    /// need [StorageFlags::DYNAMIC_STORAGE].
    pub fn set_immutable_data(&mut self, data: &[T], flags: StorageFlags) -> Result<(), BufferError> {
        if !self.buffer_storage {
            return Err(BufferError::StorageUnsupported);
        }
        if data.is_empty() || Self::ELEMENT_SIZE == 0 {
            return Err(BufferError::EmptyImmutableStorage);
        }
        self.bind();
        if self.bound_is_immutable() {
            return Err(BufferError::ImmutableStorage);
        }

        self.gl.buffer_storage(self.target, bytemuck::cast_slice(data), flags);
        log::trace!(
            "Declared immutable storage of {} elements for GPU buffer {:?} ({:?})",
            data.len(),
            self.id,
            flags
        );
        Ok(())
    }

    /// Download `byte_len` bytes starting at byte `offset`
    pub fn read_range(&self, offset: usize, byte_len: usize) -> Result<Vec<T>, BufferError> {
        if Self::ELEMENT_SIZE == 0 || byte_len % Self::ELEMENT_SIZE != 0 {
            return Err(BufferError::Misaligned {
                byte_len,
                element_size: Self::ELEMENT_SIZE,
            });
        }
        let size = self.size();
        self.check_range(offset, byte_len, size)?;

        let mut data = vec![<T as bytemuck::Zeroable>::zeroed(); byte_len / Self::ELEMENT_SIZE];
        self.gl
            .get_buffer_sub_data(self.target, offset, bytemuck::cast_slice_mut(&mut data));
        Ok(data)
    }

    /// Download the whole buffer
    pub fn read_data(&self) -> Result<Vec<T>, BufferError> {
        self.read_range(0, self.size())
    }

    /// Overwrite part of the contents starting at byte `offset`
    pub fn modify_data(&mut self, offset: usize, data: &[T]) -> Result<(), BufferError> {
        if let StorageKind::Immutable(flags) = self.storage_kind()? {
            if !flags.contains(StorageFlags::DYNAMIC_STORAGE) {
                return Err(BufferError::NotWritable { flags });
            }
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let size = self.size();
        self.check_range(offset, bytes.len(), size)?;

        self.gl.buffer_sub_data(self.target, offset, bytes);
        Ok(())
    }

    #[inline(always)]
    fn bind_now(&self, target: BufferTarget) {
        self.gl.bind_buffer(target, Some(self.id));
    }

    /// Every byte of the storage, assuming the buffer is bound to its target
    fn download_bound(&self) -> Vec<u8> {
        let mut bytes = vec![0_u8; self.parameter(BufferParameter::Size).max(0) as usize];
        self.gl.get_buffer_sub_data(self.target, 0, &mut bytes);
        bytes
    }

    /// Whether the storage bound to the target is immutable. Contexts without
    /// buffer storage support are never asked.
    fn bound_is_immutable(&self) -> bool {
        self.buffer_storage && self.parameter(BufferParameter::ImmutableStorage) != 0
    }

    #[inline(always)]
    fn parameter(&self, parameter: BufferParameter) -> i32 {
        self.gl.get_buffer_parameter(self.target, parameter)
    }

    fn check_range(&self, offset: usize, byte_len: usize, size: usize) -> Result<(), BufferError> {
        let end = offset.saturating_add(byte_len);
        if end > size {
            return Err(BufferError::OutOfRange { offset, end, size });
        }
        Ok(())
    }
}

impl<T: Pod, B: GraphicsBackend> Drop for GpuBuffer<T, B> {
    fn drop(&mut self) {
        log::trace!("Deleting GPU buffer {:?}", self.id);
        self.gl.delete_buffer(self.id);
    }
}

impl<T: Pod, B: GraphicsBackend> fmt::Debug for GpuBuffer<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("auto_bind", &self.auto_bind)
            .field("buffer_storage", &self.buffer_storage)
            .field("element", &std::any::type_name::<T>())
            .finish()
    }
}

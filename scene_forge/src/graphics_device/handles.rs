/// Opaque native object handles
///
/// Backends store their raw object handles (e.g. `vk::Buffer::as_raw()`) in
/// these newtypes. `0` is the null handle.

macro_rules! native_handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
            pub struct $name(pub u64);

            impl $name {
                pub const NULL: Self = Self(0);

                pub fn is_null(&self) -> bool {
                    self.0 == 0
                }
            }
        )*
    };
}

native_handle! {
    /// Compiled shader stage object
    ShaderModuleHandle;
    DescriptorSetLayoutHandle;
    PipelineLayoutHandle;
    PipelineCacheHandle;
    PipelineHandle;
    DescriptorPoolHandle;
    DescriptorSetHandle;
    BufferHandle;
    CommandPoolHandle;
    /// Primary command buffer
    CommandBufferHandle;
    FenceHandle;
    /// Render pass owned by the presentation chain
    RenderPassHandle;
    /// Framebuffer owned by the presentation chain
    FramebufferHandle;
}

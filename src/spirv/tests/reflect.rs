use lantern_spirv::testing::ModuleBuilder;
use lantern_spirv::*;
use spirv_headers as spv;

/// One vertex input (`Position`, vec3, location 0) and one uniform block
/// (`Camera { mat4 MVP; }`, set 0, binding 0).
fn position_camera_module() -> Vec<u32> {
    let mut b = ModuleBuilder::new();
    let main = b.reserve_id();
    let position = b.reserve_id();
    let camera = b.reserve_id();

    b.entry_point(spv::ExecutionModel::Vertex, main, "main", &[position]);
    b.name(position, "Position");
    b.name(camera, "Camera");
    b.decorate(position, spv::Decoration::Location, &[0]);
    b.decorate(camera, spv::Decoration::Binding, &[0]);
    b.decorate(camera, spv::Decoration::DescriptorSet, &[0]);

    let float = b.type_float();
    let vec3 = b.type_vector(float, 3);
    let vec4 = b.type_vector(float, 4);
    let mat4 = b.type_matrix(vec4, 4);
    let camera_ty = b.type_struct(&[mat4]);
    b.member_name(camera_ty, 0, "MVP");
    b.member_decorate(camera_ty, 0, spv::Decoration::Offset, &[0]);

    let position_ptr = b.type_pointer(spv::StorageClass::Input, vec3);
    let camera_ptr = b.type_pointer(spv::StorageClass::Uniform, camera_ty);
    b.variable(position, position_ptr, spv::StorageClass::Input);
    b.variable(camera, camera_ptr, spv::StorageClass::Uniform);
    b.function();
    b.finish()
}

#[test]
fn reflects_the_vertex_interface() {
    let reflection = Reflection::new(&position_camera_module()).unwrap();

    assert_eq!(reflection.stage(), ShaderStage::Vertex);
    assert_eq!(reflection.entry_point(), "main");
    assert_eq!(
        reflection.inputs(),
        &[Input {
            format: Format::Float3,
            location: 0,
            set: 0,
            name: "Position".to_owned(),
        }],
    );
    assert_eq!(
        reflection.uniforms(),
        &[Uniform {
            format: Format::Structure,
            binding: 0,
            set: 0,
            array_count: ArrayCount::Fixed(1),
            name: "Camera".to_owned(),
            members: vec![UniformMember {
                format: Format::Mat4,
                offset: 0,
                size: MemberSize::Bytes(64),
                name: "MVP".to_owned(),
                members: vec![],
            }],
        }],
    );
    assert!(reflection.outputs().is_empty());
    assert!(reflection.push_constants().is_empty());
}

#[test]
fn decoding_is_idempotent() {
    let module = position_camera_module();
    let first = Reflection::new(&module).unwrap();
    let second = Reflection::new(&module).unwrap();
    assert_eq!(first, second);
}

#[test]
fn uniforms_keep_declaration_order() {
    let mut b = ModuleBuilder::new();
    let high = b.reserve_id();
    let low = b.reserve_id();
    b.name(high, "A");
    b.name(low, "B");
    b.decorate(high, spv::Decoration::Binding, &[3]);
    b.decorate(low, spv::Decoration::Binding, &[0]);

    let float = b.type_float();
    let image = b.type_sampled_image(float);
    let ptr = b.type_pointer(spv::StorageClass::UniformConstant, image);
    b.variable(high, ptr, spv::StorageClass::UniformConstant);
    b.variable(low, ptr, spv::StorageClass::UniformConstant);

    let reflection = Reflection::new(&b.finish()).unwrap();
    let names: Vec<_> = reflection
        .uniforms()
        .iter()
        .map(|uniform| (uniform.name.as_str(), uniform.binding))
        .collect();
    assert_eq!(names, [("A", 3), ("B", 0)]);
}

#[test]
fn resolves_nested_struct_offsets() {
    let mut b = ModuleBuilder::new();
    let block = b.reserve_id();
    b.decorate(block, spv::Decoration::Binding, &[1]);

    let float = b.type_float();
    let vec3 = b.type_vector(float, 3);
    let vec4 = b.type_vector(float, 4);
    let mat4 = b.type_matrix(vec4, 4);

    let inner = b.type_struct(&[vec3, mat4]);
    b.member_name(inner, 0, "position");
    b.member_name(inner, 1, "transform");
    b.member_decorate(inner, 0, spv::Decoration::Offset, &[0]);
    b.member_decorate(inner, 1, spv::Decoration::Offset, &[16]);

    let outer = b.type_struct(&[inner]);
    b.member_name(outer, 0, "instance");
    b.member_decorate(outer, 0, spv::Decoration::Offset, &[0]);

    let ptr = b.type_pointer(spv::StorageClass::Uniform, outer);
    b.variable(block, ptr, spv::StorageClass::Uniform);

    let reflection = Reflection::new(&b.finish()).unwrap();
    let uniform = &reflection.uniforms()[0];
    assert_eq!(uniform.format, Format::Structure);
    assert_eq!(
        uniform.members,
        vec![UniformMember {
            format: Format::Structure,
            offset: 0,
            size: MemberSize::Bytes(80),
            name: "instance".to_owned(),
            members: vec![
                UniformMember {
                    format: Format::Float3,
                    offset: 0,
                    size: MemberSize::Bytes(12),
                    name: "position".to_owned(),
                    members: vec![],
                },
                UniformMember {
                    format: Format::Mat4,
                    offset: 16,
                    size: MemberSize::Bytes(64),
                    name: "transform".to_owned(),
                    members: vec![],
                },
            ],
        }],
    );
}

#[test]
fn runtime_array_tail_marks_a_storage_buffer() {
    let mut b = ModuleBuilder::new();
    let block = b.reserve_id();
    b.name(block, "Particles");
    b.decorate(block, spv::Decoration::Binding, &[2]);

    let int = b.type_int();
    let float = b.type_float();
    let tail = b.type_runtime_array(float);
    let block_ty = b.type_struct(&[int, tail]);
    b.decorate(block_ty, spv::Decoration::BufferBlock, &[]);
    b.member_name(block_ty, 0, "count");
    b.member_name(block_ty, 1, "data");
    b.member_decorate(block_ty, 0, spv::Decoration::Offset, &[0]);
    b.member_decorate(block_ty, 1, spv::Decoration::Offset, &[16]);

    let ptr = b.type_pointer(spv::StorageClass::Uniform, block_ty);
    b.variable(block, ptr, spv::StorageClass::Uniform);

    let reflection = Reflection::new(&b.finish()).unwrap();
    let uniform = &reflection.uniforms()[0];
    assert_eq!(uniform.format, Format::Buffer);
    assert_eq!(uniform.members[1].name, "data");
    assert_eq!(uniform.members[1].format, Format::Float);
    assert_eq!(uniform.members[1].size, MemberSize::Unbounded);
}

#[test]
fn runtime_arrays_outside_storage_buffers_are_rejected() {
    let mut b = ModuleBuilder::new();
    let block = b.reserve_id();

    let float = b.type_float();
    let tail = b.type_runtime_array(float);
    // Not BufferBlock-decorated, so the tail has nowhere to live.
    let block_ty = b.type_struct(&[tail]);
    b.member_decorate(block_ty, 0, spv::Decoration::Offset, &[0]);

    let ptr = b.type_pointer(spv::StorageClass::Uniform, block_ty);
    b.variable(block, ptr, spv::StorageClass::Uniform);

    assert!(matches!(
        Reflection::new(&b.finish()),
        Err(ReflectError::MisplacedRuntimeArray(_)),
    ));
}

#[test]
fn array_lengths_must_be_constants() {
    let mut b = ModuleBuilder::new();
    let block = b.reserve_id();

    let float = b.type_float();
    // The length operand names a type, not an OpConstant.
    let arr = b.type_array(float, float);
    let block_ty = b.type_struct(&[arr]);
    b.member_decorate(block_ty, 0, spv::Decoration::Offset, &[0]);

    let ptr = b.type_pointer(spv::StorageClass::Uniform, block_ty);
    b.variable(block, ptr, spv::StorageClass::Uniform);

    assert_eq!(
        Reflection::new(&b.finish()),
        Err(ReflectError::NonConstantArrayLength(float)),
    );
}

#[test]
fn constant_array_lengths_are_read_on_demand() {
    let mut b = ModuleBuilder::new();
    let textures = b.reserve_id();
    b.name(textures, "Textures");
    b.decorate(textures, spv::Decoration::Binding, &[0]);
    b.decorate(textures, spv::Decoration::DescriptorSet, &[1]);

    let int = b.type_int();
    let float = b.type_float();
    let image = b.type_sampled_image(float);
    let four = b.constant_u32(int, 4);
    let array = b.type_array(image, four);
    let ptr = b.type_pointer(spv::StorageClass::UniformConstant, array);
    b.variable(textures, ptr, spv::StorageClass::UniformConstant);

    let reflection = Reflection::new(&b.finish()).unwrap();
    let uniform = &reflection.uniforms()[0];
    assert_eq!(uniform.format, Format::SampledImage);
    assert_eq!(uniform.array_count, ArrayCount::Fixed(4));
    assert_eq!((uniform.set, uniform.binding), (1, 0));
    assert!(uniform.members.is_empty());
}

#[test]
fn push_constants_carry_member_layouts() {
    let mut b = ModuleBuilder::new();
    let constants = b.reserve_id();
    b.name(constants, "Constants");

    let float = b.type_float();
    let vec4 = b.type_vector(float, 4);
    let block_ty = b.type_struct(&[float, vec4]);
    b.member_name(block_ty, 0, "Time");
    b.member_name(block_ty, 1, "Tint");
    b.member_decorate(block_ty, 0, spv::Decoration::Offset, &[0]);
    b.member_decorate(block_ty, 1, spv::Decoration::Offset, &[16]);

    let ptr = b.type_pointer(spv::StorageClass::PushConstant, block_ty);
    b.variable(constants, ptr, spv::StorageClass::PushConstant);

    let reflection = Reflection::new(&b.finish()).unwrap();
    assert!(reflection.uniforms().is_empty());
    assert_eq!(
        reflection.push_constants(),
        &[PushConstant {
            format: Format::Structure,
            name: "Constants".to_owned(),
            members: vec![
                UniformMember {
                    format: Format::Float,
                    offset: 0,
                    size: MemberSize::Bytes(4),
                    name: "Time".to_owned(),
                    members: vec![],
                },
                UniformMember {
                    format: Format::Float4,
                    offset: 16,
                    size: MemberSize::Bytes(16),
                    name: "Tint".to_owned(),
                    members: vec![],
                },
            ],
        }],
    );
}

#[test]
fn fragment_outputs_are_reflected() {
    let mut b = ModuleBuilder::new();
    let main = b.reserve_id();
    let color = b.reserve_id();
    b.entry_point(spv::ExecutionModel::Fragment, main, "main", &[color]);
    b.name(color, "Color");
    b.decorate(color, spv::Decoration::Location, &[0]);

    let float = b.type_float();
    let vec4 = b.type_vector(float, 4);
    let ptr = b.type_pointer(spv::StorageClass::Output, vec4);
    b.variable(color, ptr, spv::StorageClass::Output);

    let reflection = Reflection::new(&b.finish()).unwrap();
    assert_eq!(reflection.stage(), ShaderStage::Fragment);
    assert_eq!(
        reflection.outputs(),
        &[Output {
            format: Format::Float4,
            location: 0,
            name: "Color".to_owned(),
        }],
    );
}

#[test]
fn stripped_modules_reflect_empty_names() {
    let mut b = ModuleBuilder::new();
    let input = b.reserve_id();
    b.decorate(input, spv::Decoration::Location, &[2]);

    let float = b.type_float();
    let vec2 = b.type_vector(float, 2);
    let ptr = b.type_pointer(spv::StorageClass::Input, vec2);
    b.variable(input, ptr, spv::StorageClass::Input);

    let reflection = Reflection::new(&b.finish()).unwrap();
    assert_eq!(
        reflection.inputs(),
        &[Input {
            format: Format::Float2,
            location: 2,
            set: 0,
            name: String::new(),
        }],
    );
}

#[test]
fn unsupported_shapes_fail_the_decode() {
    let mut b = ModuleBuilder::new();
    let input = b.reserve_id();

    let float = b.type_float();
    let vec5 = b.type_vector(float, 5);
    let ptr = b.type_pointer(spv::StorageClass::Input, vec5);
    b.variable(input, ptr, spv::StorageClass::Input);

    assert_eq!(
        Reflection::new(&b.finish()),
        Err(ReflectError::UnsupportedType(vec5)),
    );
}

#[test]
fn block_members_require_offsets() {
    let mut b = ModuleBuilder::new();
    let block = b.reserve_id();

    let float = b.type_float();
    let block_ty = b.type_struct(&[float]);
    // No Offset decoration on member 0.
    let ptr = b.type_pointer(spv::StorageClass::Uniform, block_ty);
    b.variable(block, ptr, spv::StorageClass::Uniform);

    assert_eq!(
        Reflection::new(&b.finish()),
        Err(ReflectError::MissingMemberOffset(block_ty, 0)),
    );
}

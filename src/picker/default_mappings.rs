//! Hard-coded mappings for glibc and libstdc++, assembled by inspecting the
//! headers shipped on a stock Linux toolchain. Private implementation
//! headers (`<bits/...>`, `<asm/...>`, `*.tcc`) map to the public headers
//! users are supposed to write; a handful of symbols (`NULL` being the
//! canonical case) are provided by several unrelated headers and get their
//! own table.

use super::{IncludePicker, MappedInclude, Visibility};

use Visibility::{Private, Public};

struct IncludeMapEntry {
    map_from: &'static str,
    from_visibility: Visibility,
    map_to: &'static str,
    to_visibility: Visibility,
}

const fn entry(
    map_from: &'static str,
    from_visibility: Visibility,
    map_to: &'static str,
    to_visibility: Visibility,
) -> IncludeMapEntry {
    IncludeMapEntry {
        map_from,
        from_visibility,
        map_to,
        to_visibility,
    }
}

/// Private glibc headers and where to get them from.
const C_INCLUDE_MAP: &[IncludeMapEntry] = &[
    entry("<asm/errno.h>", Private, "<errno.h>", Public),
    entry("<asm/ioctls.h>", Private, "<sys/ioctl.h>", Public),
    entry("<asm/posix_types.h>", Private, "<sys/types.h>", Public),
    entry("<asm/ptrace.h>", Private, "<sys/ptrace.h>", Public),
    entry("<asm/sigcontext.h>", Private, "<signal.h>", Public),
    entry("<asm/unistd.h>", Private, "<unistd.h>", Public),
    entry("<bits/byteswap.h>", Private, "<byteswap.h>", Public),
    entry("<bits/confname.h>", Private, "<unistd.h>", Public),
    entry("<bits/dirent.h>", Private, "<dirent.h>", Public),
    entry("<bits/dlfcn.h>", Private, "<dlfcn.h>", Public),
    entry("<bits/endian.h>", Private, "<endian.h>", Public),
    entry("<bits/errno.h>", Private, "<errno.h>", Public),
    entry("<bits/fcntl.h>", Private, "<fcntl.h>", Public),
    entry("<bits/fenv.h>", Private, "<fenv.h>", Public),
    entry("<bits/huge_val.h>", Private, "<math.h>", Public),
    entry("<bits/in.h>", Private, "<netinet/in.h>", Public),
    entry("<bits/ioctls.h>", Private, "<sys/ioctl.h>", Public),
    entry("<bits/limits.h>", Private, "<limits.h>", Public),
    entry("<bits/local_lim.h>", Private, "<limits.h>", Public),
    entry("<bits/mathcalls.h>", Private, "<math.h>", Public),
    entry("<bits/mman.h>", Private, "<sys/mman.h>", Public),
    entry("<bits/nan.h>", Private, "<math.h>", Public),
    entry("<bits/netdb.h>", Private, "<netdb.h>", Public),
    entry("<bits/poll.h>", Private, "<poll.h>", Public),
    entry("<bits/posix1_lim.h>", Private, "<limits.h>", Public),
    entry("<bits/posix2_lim.h>", Private, "<limits.h>", Public),
    entry("<bits/posix_opt.h>", Private, "<unistd.h>", Public),
    entry("<bits/pthreadtypes.h>", Private, "<pthread.h>", Public),
    entry("<bits/resource.h>", Private, "<sys/resource.h>", Public),
    entry("<bits/sched.h>", Private, "<sched.h>", Public),
    entry("<bits/select.h>", Private, "<sys/select.h>", Public),
    entry("<bits/sigaction.h>", Private, "<signal.h>", Public),
    entry("<bits/siginfo.h>", Private, "<signal.h>", Public),
    entry("<bits/signum.h>", Private, "<signal.h>", Public),
    entry("<bits/sigset.h>", Private, "<signal.h>", Public),
    entry("<bits/sigstack.h>", Private, "<signal.h>", Public),
    entry("<bits/socket.h>", Private, "<sys/socket.h>", Public),
    entry("<bits/stat.h>", Private, "<sys/stat.h>", Public),
    entry("<bits/statfs.h>", Private, "<sys/statfs.h>", Public),
    entry("<bits/statvfs.h>", Private, "<sys/statvfs.h>", Public),
    entry("<bits/stdio_lim.h>", Private, "<stdio.h>", Public),
    entry("<bits/termios.h>", Private, "<termios.h>", Public),
    entry("<bits/time.h>", Private, "<sys/time.h>", Public),
    entry("<bits/timex.h>", Private, "<sys/timex.h>", Public),
    entry("<bits/types.h>", Private, "<sys/types.h>", Public),
    entry("<bits/uio.h>", Private, "<sys/uio.h>", Public),
    entry("<bits/utsname.h>", Private, "<sys/utsname.h>", Public),
    entry("<bits/waitflags.h>", Private, "<sys/wait.h>", Public),
    entry("<bits/waitstatus.h>", Private, "<sys/wait.h>", Public),
    entry("<linux/errno.h>", Private, "<errno.h>", Public),
    entry("<linux/limits.h>", Private, "<limits.h>", Public),
    entry("<linux/prctl.h>", Private, "<sys/prctl.h>", Public),
    entry("<sys/ucontext.h>", Private, "<ucontext.h>", Public),
];

/// Each C header is also available through its C++ `<cfoo>` wrapper; both
/// sides are legitimate includes.
const C_TO_CPP_INCLUDE_MAP: &[IncludeMapEntry] = &[
    entry("<assert.h>", Public, "<cassert>", Public),
    entry("<complex.h>", Public, "<ccomplex>", Public),
    entry("<ctype.h>", Public, "<cctype>", Public),
    entry("<errno.h>", Public, "<cerrno>", Public),
    entry("<fenv.h>", Public, "<cfenv>", Public),
    entry("<float.h>", Public, "<cfloat>", Public),
    entry("<inttypes.h>", Public, "<cinttypes>", Public),
    entry("<limits.h>", Public, "<climits>", Public),
    entry("<locale.h>", Public, "<clocale>", Public),
    entry("<math.h>", Public, "<cmath>", Public),
    entry("<setjmp.h>", Public, "<csetjmp>", Public),
    entry("<signal.h>", Public, "<csignal>", Public),
    entry("<stdarg.h>", Public, "<cstdarg>", Public),
    entry("<stddef.h>", Public, "<cstddef>", Public),
    entry("<stdint.h>", Public, "<cstdint>", Public),
    entry("<stdio.h>", Public, "<cstdio>", Public),
    entry("<stdlib.h>", Public, "<cstdlib>", Public),
    entry("<string.h>", Public, "<cstring>", Public),
    entry("<time.h>", Public, "<ctime>", Public),
    entry("<wchar.h>", Public, "<cwchar>", Public),
    entry("<wctype.h>", Public, "<cwctype>", Public),
];

/// Private libstdc++ headers.
const CPP_INCLUDE_MAP: &[IncludeMapEntry] = &[
    entry("<bits/algorithmfwd.h>", Private, "<algorithm>", Public),
    entry("<bits/allocator.h>", Private, "<memory>", Public),
    entry("<bits/basic_file.h>", Private, "<fstream>", Public),
    entry("<bits/basic_ios.h>", Private, "<ios>", Public),
    entry("<bits/basic_string.h>", Private, "<string>", Public),
    entry("<bits/basic_string.tcc>", Private, "<string>", Public),
    entry("<bits/char_traits.h>", Private, "<string>", Public),
    entry("<bits/deque.tcc>", Private, "<deque>", Public),
    entry("<bits/exception.h>", Private, "<exception>", Public),
    entry("<bits/fstream.tcc>", Private, "<fstream>", Public),
    entry("<bits/functional_hash.h>", Private, "<functional>", Public),
    entry("<bits/ios_base.h>", Private, "<ios>", Public),
    entry("<bits/istream.tcc>", Private, "<istream>", Public),
    entry("<bits/list.tcc>", Private, "<list>", Public),
    entry("<bits/ostream.tcc>", Private, "<ostream>", Public),
    entry("<bits/shared_ptr.h>", Private, "<memory>", Public),
    entry("<bits/sstream.tcc>", Private, "<sstream>", Public),
    entry("<bits/stl_algo.h>", Private, "<algorithm>", Public),
    entry("<bits/stl_algobase.h>", Private, "<algorithm>", Public),
    entry("<bits/stl_bvector.h>", Private, "<vector>", Public),
    entry("<bits/stl_deque.h>", Private, "<deque>", Public),
    entry("<bits/stl_function.h>", Private, "<functional>", Public),
    entry("<bits/stl_heap.h>", Private, "<algorithm>", Public),
    entry("<bits/stl_iterator.h>", Private, "<iterator>", Public),
    entry("<bits/stl_iterator_base_types.h>", Private, "<iterator>", Public),
    entry("<bits/stl_list.h>", Private, "<list>", Public),
    entry("<bits/stl_map.h>", Private, "<map>", Public),
    entry("<bits/stl_multimap.h>", Private, "<map>", Public),
    entry("<bits/stl_multiset.h>", Private, "<set>", Public),
    entry("<bits/stl_numeric.h>", Private, "<numeric>", Public),
    entry("<bits/stl_pair.h>", Private, "<utility>", Public),
    entry("<bits/stl_queue.h>", Private, "<queue>", Public),
    entry("<bits/stl_set.h>", Private, "<set>", Public),
    entry("<bits/stl_stack.h>", Private, "<stack>", Public),
    entry("<bits/stl_tree.h>", Private, "<map>", Public),
    entry("<bits/stl_tree.h>", Private, "<set>", Public),
    entry("<bits/stl_uninitialized.h>", Private, "<memory>", Public),
    entry("<bits/stl_vector.h>", Private, "<vector>", Public),
    entry("<bits/streambuf.tcc>", Private, "<streambuf>", Public),
    entry("<bits/stream_iterator.h>", Private, "<iterator>", Public),
    entry("<bits/streambuf_iterator.h>", Private, "<iterator>", Public),
    entry("<bits/stringfwd.h>", Private, "<string>", Public),
    entry("<bits/unique_ptr.h>", Private, "<memory>", Public),
    entry("<bits/unordered_map.h>", Private, "<unordered_map>", Public),
    entry("<bits/unordered_set.h>", Private, "<unordered_set>", Public),
    entry("<bits/vector.tcc>", Private, "<vector>", Public),
];

/// Public-to-public re-exports within the C++ standard library: the key is
/// includable itself, but the listed headers are guaranteed to provide it
/// too.
const CPP_PUBLIC_INCLUDE_MAP: &[IncludeMapEntry] = &[
    entry("<ios>", Public, "<istream>", Public),
    entry("<ios>", Public, "<ostream>", Public),
    entry("<istream>", Public, "<fstream>", Public),
    entry("<istream>", Public, "<iostream>", Public),
    entry("<istream>", Public, "<sstream>", Public),
    entry("<ostream>", Public, "<fstream>", Public),
    entry("<ostream>", Public, "<iostream>", Public),
    entry("<ostream>", Public, "<sstream>", Public),
    entry("<iosfwd>", Public, "<ios>", Public),
    entry("<iosfwd>", Public, "<streambuf>", Public),
];

/// Symbols that several headers are documented to provide. Order matters:
/// the first entry is the best suggestion.
const C_SYMBOL_MAP: &[IncludeMapEntry] = &[
    entry("NULL", Private, "<stddef.h>", Public),
    entry("NULL", Private, "<cstddef>", Public),
    entry("NULL", Private, "<clocale>", Public),
    entry("NULL", Private, "<cstdio>", Public),
    entry("NULL", Private, "<cstdlib>", Public),
    entry("NULL", Private, "<cstring>", Public),
    entry("NULL", Private, "<ctime>", Public),
    entry("NULL", Private, "<cwchar>", Public),
    entry("NULL", Private, "<locale.h>", Public),
    entry("NULL", Private, "<stdio.h>", Public),
    entry("NULL", Private, "<stdlib.h>", Public),
    entry("NULL", Private, "<string.h>", Public),
    entry("NULL", Private, "<time.h>", Public),
    entry("NULL", Private, "<wchar.h>", Public),
    entry("size_t", Private, "<stddef.h>", Public),
    entry("size_t", Private, "<cstddef>", Public),
    entry("size_t", Private, "<cstdio>", Public),
    entry("size_t", Private, "<cstdlib>", Public),
    entry("size_t", Private, "<cstring>", Public),
    entry("size_t", Private, "<ctime>", Public),
    entry("size_t", Private, "<cwchar>", Public),
    entry("size_t", Private, "<stdio.h>", Public),
    entry("size_t", Private, "<stdlib.h>", Public),
    entry("size_t", Private, "<string.h>", Public),
    entry("size_t", Private, "<time.h>", Public),
    entry("size_t", Private, "<wchar.h>", Public),
    entry("ptrdiff_t", Private, "<stddef.h>", Public),
    entry("ptrdiff_t", Private, "<cstddef>", Public),
    entry("offsetof", Private, "<stddef.h>", Public),
    entry("offsetof", Private, "<cstddef>", Public),
    entry("EOF", Private, "<stdio.h>", Public),
    entry("EOF", Private, "<cstdio>", Public),
    entry("FILE", Private, "<stdio.h>", Public),
    entry("FILE", Private, "<cstdio>", Public),
    entry("va_list", Private, "<stdarg.h>", Public),
    entry("va_list", Private, "<cstdarg>", Public),
    entry("time_t", Private, "<time.h>", Public),
    entry("time_t", Private, "<ctime>", Public),
    entry("tm", Private, "<time.h>", Public),
    entry("tm", Private, "<ctime>", Public),
    entry("dev_t", Private, "<sys/types.h>", Public),
    entry("dev_t", Private, "<sys/stat.h>", Public),
    entry("mode_t", Private, "<sys/types.h>", Public),
    entry("mode_t", Private, "<sys/stat.h>", Public),
    entry("mode_t", Private, "<fcntl.h>", Public),
    entry("off_t", Private, "<sys/types.h>", Public),
    entry("off_t", Private, "<unistd.h>", Public),
    entry("pid_t", Private, "<sys/types.h>", Public),
    entry("pid_t", Private, "<unistd.h>", Public),
    entry("ssize_t", Private, "<sys/types.h>", Public),
    entry("ssize_t", Private, "<unistd.h>", Public),
    entry("uid_t", Private, "<sys/types.h>", Public),
    entry("uid_t", Private, "<unistd.h>", Public),
    entry("gid_t", Private, "<sys/types.h>", Public),
    entry("gid_t", Private, "<unistd.h>", Public),
    entry("int8_t", Private, "<stdint.h>", Public),
    entry("int8_t", Private, "<cstdint>", Public),
    entry("int16_t", Private, "<stdint.h>", Public),
    entry("int16_t", Private, "<cstdint>", Public),
    entry("int32_t", Private, "<stdint.h>", Public),
    entry("int32_t", Private, "<cstdint>", Public),
    entry("int64_t", Private, "<stdint.h>", Public),
    entry("int64_t", Private, "<cstdint>", Public),
    entry("uint8_t", Private, "<stdint.h>", Public),
    entry("uint8_t", Private, "<cstdint>", Public),
    entry("uint16_t", Private, "<stdint.h>", Public),
    entry("uint16_t", Private, "<cstdint>", Public),
    entry("uint32_t", Private, "<stdint.h>", Public),
    entry("uint32_t", Private, "<cstdint>", Public),
    entry("uint64_t", Private, "<stdint.h>", Public),
    entry("uint64_t", Private, "<cstdint>", Public),
    entry("intptr_t", Private, "<stdint.h>", Public),
    entry("intptr_t", Private, "<cstdint>", Public),
    entry("uintptr_t", Private, "<stdint.h>", Public),
    entry("uintptr_t", Private, "<cstdint>", Public),
];

const CPP_SYMBOL_MAP: &[IncludeMapEntry] = &[
    entry("std::allocator", Private, "<memory>", Public),
    entry("std::allocator", Private, "<string>", Public),
    entry("std::allocator", Private, "<vector>", Public),
    entry("std::allocator", Private, "<map>", Public),
    entry("std::allocator", Private, "<set>", Public),
    entry("std::char_traits", Private, "<string>", Public),
    entry("std::hash", Private, "<functional>", Public),
    entry("std::nullptr_t", Private, "<cstddef>", Public),
    entry("std::pair", Private, "<utility>", Public),
    entry("std::size_t", Private, "<cstddef>", Public),
    entry("std::size_t", Private, "<cstdio>", Public),
    entry("std::size_t", Private, "<cstdlib>", Public),
    entry("std::size_t", Private, "<cstring>", Public),
    entry("std::size_t", Private, "<ctime>", Public),
    entry("std::size_t", Private, "<cwchar>", Public),
    entry("std::string", Private, "<string>", Public),
    entry("std::swap", Private, "<utility>", Public),
    entry("std::swap", Private, "<algorithm>", Public),
    entry("std::wstring", Private, "<string>", Public),
];

fn add_include_entries(picker: &mut IncludePicker, entries: &[IncludeMapEntry]) {
    for e in entries {
        picker.add_include_mapping(
            e.map_from,
            e.from_visibility,
            MappedInclude::new(e.map_to),
            e.to_visibility,
        );
    }
}

fn add_symbol_entries(picker: &mut IncludePicker, entries: &[IncludeMapEntry]) {
    for e in entries {
        picker.add_symbol_mapping(e.map_from, MappedInclude::new(e.map_to), e.to_visibility);
    }
}

pub fn add_default_mappings(picker: &mut IncludePicker) {
    add_include_entries(picker, C_INCLUDE_MAP);
    add_include_entries(picker, C_TO_CPP_INCLUDE_MAP);
    add_include_entries(picker, CPP_INCLUDE_MAP);
    add_include_entries(picker, CPP_PUBLIC_INCLUDE_MAP);
    add_symbol_entries(picker, C_SYMBOL_MAP);
    add_symbol_entries(picker, CPP_SYMBOL_MAP);
}

#[cfg(test)]
mod tests {
    use crate::picker::IncludePicker;

    fn quoted(values: &[crate::picker::MappedInclude]) -> Vec<String> {
        values.iter().map(|m| m.quoted_include.clone()).collect()
    }

    #[test]
    fn test_null_candidates_start_with_stddef() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        let headers = quoted(&p.get_candidate_headers_for_symbol("NULL"));
        assert_eq!(
            headers,
            vec![
                "<stddef.h>", "<cstddef>", "<clocale>", "<cstdio>", "<cstdlib>", "<cstring>",
                "<ctime>", "<cwchar>", "<locale.h>", "<stdio.h>", "<stdlib.h>", "<string.h>",
                "<time.h>", "<wchar.h>",
            ]
        );
    }

    #[test]
    fn test_symbol_candidates() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_symbol("dev_t")),
            vec!["<sys/types.h>", "<sys/stat.h>"]
        );
        assert_eq!(
            quoted(&p.get_candidate_headers_for_symbol("std::allocator")),
            vec!["<memory>", "<string>", "<vector>", "<map>", "<set>"]
        );
        assert!(p.get_candidate_headers_for_symbol("foo").is_empty());
    }

    #[test]
    fn test_c_header_candidates() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/include/bits/dlfcn.h")),
            vec!["<dlfcn.h>"]
        );
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/grte/v1/include/assert.h")),
            vec!["<assert.h>", "<cassert>"]
        );
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/grte/v1/include/stdarg.h")),
            vec!["<stdarg.h>", "<cstdarg>"]
        );
    }

    #[test]
    fn test_cpp_header_candidates() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/include/c++/4.2/bits/allocator.h")),
            vec!["<memory>"]
        );
    }

    #[test]
    fn test_private_header_expands_through_public_reexports() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/include/c++/4.2/bits/istream.tcc")),
            vec!["<istream>", "<fstream>", "<iostream>", "<sstream>"]
        );
    }

    #[test]
    fn test_private_value_is_filtered_in_recursion() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/include/linux/errno.h")),
            vec!["<errno.h>", "<cerrno>"]
        );
    }

    #[test]
    fn test_unmapped_file_maps_to_itself() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("/usr/grte/v1/include/poll.h")),
            vec!["<poll.h>"]
        );
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("././././my/dot.h")),
            vec!["\"my/dot.h\""]
        );
    }

    #[test]
    fn test_has_mapping_direct_and_indirect() {
        let mut p = IncludePicker::new();
        p.finalize_added_includes();
        assert!(p.has_mapping("/usr/include/stdio.h", "/usr/include/c++/4.2/cstdio"));
        assert!(p.has_mapping(
            "/usr/include/c++/4.2/bits/stl_deque.h",
            "/usr/include/c++/4.2/deque"
        ));
        assert!(p.has_mapping("/usr/include/bits/stat.h", "/usr/include/sys/stat.h"));
        assert!(!p.has_mapping("/usr/include/bits/syscall.h", "/usr/include/sys/stat.h"));
        // Indirectly, through the transitive closure.
        assert!(p.has_mapping("/usr/include/c++/4.2/ios", "/usr/include/c++/4.2/iostream"));
        assert!(p.has_mapping("/usr/include/linux/errno.h", "/usr/include/errno.h"));
        // Identity always holds.
        assert!(p.has_mapping("my/file.h", "my/file.h"));
    }
}
